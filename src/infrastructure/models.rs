use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::catalog::{Category, Product};
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderItem, OrderStatus};
use crate::domain::review::ReviewView;
use crate::domain::user::{Address, User};
use crate::schema::{
    addresses, cart_items, carts, categories, order_items, orders, product_categories, products,
    reviews, users,
};

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            uuid: row.uuid,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow<'a> {
    pub uuid: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: &'a BigDecimal,
    pub stock: i32,
}

/// `None` fields are left out of the `SET` clause.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChangeset<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<&'a BigDecimal>,
    pub stock: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_categories)]
pub struct ProductCategoryRow {
    pub product_id: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            uuid: row.uuid,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategoryRow<'a> {
    pub uuid: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = categories)]
pub struct CategoryChangeset<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReviewRow {
    pub id: i64,
    pub uuid: Uuid,
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for ReviewView {
    fn from(row: ReviewRow) -> Self {
        ReviewView {
            id: row.id,
            uuid: row.uuid,
            product_id: row.product_id,
            user_id: row.user_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReviewRow<'a> {
    pub uuid: Uuid,
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i16,
    pub comment: Option<&'a str>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = reviews)]
pub struct ReviewChangeset<'a> {
    pub rating: Option<i16>,
    pub comment: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ── Accounts ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i64,
    pub uuid: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            uuid: row.uuid,
            email: row.email,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressRow {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub line1: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: row.id,
            uuid: row.uuid,
            user_id: row.user_id,
            line1: row.line1,
            city: row.city,
            postal_code: row.postal_code,
            country: row.country,
        }
    }
}

// ── Carts ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCartRow {
    pub uuid: Uuid,
    pub user_id: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct CartItemRow {
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub address_id: Option<i64>,
    pub total_price: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
        let status: OrderStatus = self.status.parse().map_err(|_| {
            DomainError::Internal(format!(
                "order {} has unknown status '{}' in store",
                self.id, self.status
            ))
        })?;
        Ok(Order {
            id: self.id,
            uuid: self.uuid,
            user_id: self.user_id,
            address_id: self.address_id,
            total_price: self.total_price,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items: items.into_iter().map(OrderItem::from).collect(),
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub uuid: Uuid,
    pub user_id: i64,
    pub address_id: Option<i64>,
    pub total_price: &'a BigDecimal,
    pub status: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub price_at_order: BigDecimal,
    pub quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            price_at_order: row.price_at_order,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow<'a> {
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: &'a str,
    pub price_at_order: &'a BigDecimal,
    pub quantity: i32,
}
