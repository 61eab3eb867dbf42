//! Query filters for listings.
//!
//! Every filter has a `normalized` form: defaults applied, limits clamped,
//! decimals reduced to their canonical scale. Repositories and cache keys
//! both consume the normalized form, so two requests that mean the same
//! query land on the same cache slot.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::OrderStatus;

pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    CreatedAt,
    Price,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    TotalPrice,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    #[default]
    CreatedAt,
    Rating,
}

fn clamp_page(page: i64) -> i64 {
    page.max(1)
}

fn clamp_limit(limit: i64, default: i64) -> i64 {
    if limit <= 0 || limit > MAX_LIMIT {
        default
    } else {
        limit
    }
}

/// Offset of the first row of `page` (1-based).
pub fn offset(page: i64, limit: i64) -> i64 {
    page.saturating_sub(1).max(0).saturating_mul(limit.max(0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFilters {
    pub page: i64,
    pub limit: i64,
    pub category_id: Option<i64>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub sort_by: ProductSort,
    pub sort_order: SortOrder,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            category_id: None,
            min_price: None,
            max_price: None,
            sort_by: ProductSort::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ProductFilters {
    pub fn normalized(mut self) -> Self {
        self.page = clamp_page(self.page);
        self.limit = clamp_limit(self.limit, 20);
        self.min_price = self.min_price.map(|p| p.normalized());
        self.max_price = self.max_price.map(|p| p.normalized());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFilters {
    pub page: i64,
    pub limit: i64,
    pub status: Option<OrderStatus>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub min_amount: Option<BigDecimal>,
    pub max_amount: Option<BigDecimal>,
    pub sort_by: OrderSort,
    pub sort_order: SortOrder,
}

impl Default for OrderFilters {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            status: None,
            date_from: None,
            date_to: None,
            min_amount: None,
            max_amount: None,
            sort_by: OrderSort::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl OrderFilters {
    pub fn normalized(mut self) -> Self {
        self.page = clamp_page(self.page);
        self.limit = clamp_limit(self.limit, 10);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdminOrderFilters {
    pub orders: OrderFilters,
    pub user_id: Option<i64>,
}

impl AdminOrderFilters {
    pub fn normalized(mut self) -> Self {
        self.orders = self.orders.normalized();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewFilters {
    pub page: i64,
    pub limit: i64,
    pub product_id: Option<i64>,
    pub user_id: Option<i64>,
    pub rating: Option<i16>,
    pub sort_by: ReviewSort,
    pub sort_order: SortOrder,
}

impl Default for ReviewFilters {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            product_id: None,
            user_id: None,
            rating: None,
            sort_by: ReviewSort::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ReviewFilters {
    pub fn normalized(mut self) -> Self {
        self.page = clamp_page(self.page);
        self.limit = clamp_limit(self.limit, 20);
        self
    }
}
