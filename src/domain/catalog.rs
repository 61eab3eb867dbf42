use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

pub const PRODUCT_NAME_MIN: usize = 2;
pub const PRODUCT_NAME_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 1000;
pub const CATEGORY_NAME_MAX: usize = 100;
pub const CATEGORY_DESCRIPTION_MAX: usize = 500;

/// Inventory row. The only source of truth for price and stock.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    pub category_ids: Vec<i64>,
}

/// Partial product update. `None` leaves the column untouched; a
/// `Some(ids)` category list replaces the product's category set.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub stock: Option<i32>,
    pub category_ids: Option<Vec<i64>>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.category_ids.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

// ── Read models (cacheable) ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    pub categories: Vec<CategorySummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    pub fn new(product: Product, categories: Vec<CategorySummary>) -> Self {
        Self {
            id: product.id,
            uuid: product.uuid,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            categories,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<ProductView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub product_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryList {
    pub items: Vec<CategoryView>,
    pub total: i64,
}

// ── Validation ───────────────────────────────────────────────────────────────

fn invalid_product(msg: &str) -> DomainError {
    DomainError::InvalidProductData(msg.to_string())
}

pub fn validate_product_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    let len = name.chars().count();
    if !(PRODUCT_NAME_MIN..=PRODUCT_NAME_MAX).contains(&len) {
        return Err(invalid_product("name must be between 2 and 200 characters"));
    }
    Ok(name.to_string())
}

pub fn validate_price(price: &BigDecimal) -> Result<(), DomainError> {
    if *price <= BigDecimal::from(0) {
        return Err(invalid_product("price must be greater than 0"));
    }
    let (_, scale) = price.normalized().as_bigint_and_exponent();
    if scale > 2 {
        return Err(invalid_product("price must have at most 2 decimal places"));
    }
    Ok(())
}

pub fn validate_stock(stock: i32) -> Result<(), DomainError> {
    if stock < 0 {
        return Err(invalid_product("stock must not be negative"));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), DomainError> {
    match description {
        Some(d) if d.chars().count() > DESCRIPTION_MAX => {
            Err(invalid_product("description must be at most 1000 characters"))
        }
        _ => Ok(()),
    }
}

impl NewProduct {
    /// Returns a copy with the name trimmed, or the first rule violated.
    pub fn validated(mut self) -> Result<Self, DomainError> {
        self.name = validate_product_name(&self.name)?;
        validate_description(self.description.as_deref())?;
        validate_price(&self.price)?;
        validate_stock(self.stock)?;
        if self.category_ids.is_empty() {
            return Err(invalid_product("at least one category is required"));
        }
        Ok(self)
    }
}

impl ProductChanges {
    pub fn validated(mut self) -> Result<Self, DomainError> {
        if self.is_empty() {
            return Err(DomainError::NothingToUpdate);
        }
        if let Some(name) = &self.name {
            self.name = Some(validate_product_name(name)?);
        }
        validate_description(self.description.as_deref())?;
        if let Some(price) = &self.price {
            validate_price(price)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        if matches!(&self.category_ids, Some(ids) if ids.is_empty()) {
            return Err(invalid_product("category list must not be empty"));
        }
        Ok(self)
    }
}

fn validate_category_fields(
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Option<String>, DomainError> {
    if let Some(d) = description {
        if d.chars().count() > CATEGORY_DESCRIPTION_MAX {
            return Err(DomainError::InvalidCategoryData(
                "description must be at most 500 characters".to_string(),
            ));
        }
    }
    name.map(|n| {
        let n = n.trim();
        let len = n.chars().count();
        if (2..=CATEGORY_NAME_MAX).contains(&len) {
            Ok(n.to_string())
        } else {
            Err(DomainError::InvalidCategoryData(
                "name must be between 2 and 100 characters".to_string(),
            ))
        }
    })
    .transpose()
}

impl NewCategory {
    pub fn validated(mut self) -> Result<Self, DomainError> {
        if let Some(name) = validate_category_fields(Some(&self.name), self.description.as_deref())? {
            self.name = name;
        }
        Ok(self)
    }
}

impl CategoryChanges {
    pub fn validated(mut self) -> Result<Self, DomainError> {
        if self.name.is_none() && self.description.is_none() {
            return Err(DomainError::NothingToUpdate);
        }
        self.name = validate_category_fields(self.name.as_deref(), self.description.as_deref())?;
        Ok(self)
    }
}
