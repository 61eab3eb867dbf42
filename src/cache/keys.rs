use serde::Serialize;

use super::CacheError;
use crate::domain::filters::{ProductFilters, ReviewFilters};

pub const NAMESPACE: &str = "shop";

pub const PRODUCT_PATTERN: &str = "shop:product:*";
pub const PRODUCT_LIST_PATTERN: &str = "shop:products:filter:*";
pub const REVIEW_LIST_PATTERN: &str = "shop:reviews:filter:*";
pub const REVIEW_PATTERN: &str = "shop:review:*";

pub fn product(id: i64) -> String {
    format!("{NAMESPACE}:product:{id}")
}

pub fn category(id: i64) -> String {
    format!("{NAMESPACE}:category:{id}")
}

pub fn all_categories() -> String {
    format!("{NAMESPACE}:categories:all")
}

pub fn review(id: i64) -> String {
    format!("{NAMESPACE}:review:{id}")
}

fn filter_key<F: Serialize>(kind: &str, filters: &F) -> Result<String, CacheError> {
    let json = serde_json::to_string(filters)?;
    Ok(format!("{NAMESPACE}:{kind}:filter:{json}"))
}

/// `shop:products:filter:{json}`; callers pass normalized filters.
pub fn product_list(filters: &ProductFilters) -> Result<String, CacheError> {
    filter_key("products", filters)
}

pub fn review_list(filters: &ReviewFilters) -> Result<String, CacheError> {
    filter_key("reviews", filters)
}
