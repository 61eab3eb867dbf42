use std::collections::HashMap;

use super::cart::Cart;
use super::catalog::{
    Category, CategoryChanges, CategorySummary, CategoryView, NewCategory, NewProduct, Product,
    ProductChanges,
};
use super::errors::DomainError;
use super::filters::{AdminOrderFilters, OrderFilters, ProductFilters, ReviewFilters};
use super::order::{Order, OrderPage, OrderStatus, PlaceOrder};
use super::review::{NewReview, ReviewChanges, ReviewView};
use super::user::{Address, User};

pub trait ProductRepository: Send + Sync + 'static {
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError>;
    /// One page of products plus the total row count for the filter.
    fn list(&self, filters: &ProductFilters) -> Result<(Vec<Product>, i64), DomainError>;
    fn categories_of(
        &self,
        product_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<CategorySummary>>, DomainError>;
    /// Inserts the product and its category links as one unit.
    fn create(&self, product: &NewProduct) -> Result<Product, DomainError>;
    /// `Ok(None)` when no product has `id`.
    fn update(&self, id: i64, changes: &ProductChanges) -> Result<Option<Product>, DomainError>;
    fn delete(&self, id: i64) -> Result<bool, DomainError>;
}

pub trait CategoryRepository: Send + Sync + 'static {
    fn find_by_id(&self, id: i64) -> Result<Option<CategoryView>, DomainError>;
    fn list_all(&self) -> Result<Vec<CategoryView>, DomainError>;
    fn all_exist(&self, ids: &[i64]) -> Result<bool, DomainError>;
    fn create(&self, category: &NewCategory) -> Result<Category, DomainError>;
    fn update(&self, id: i64, changes: &CategoryChanges) -> Result<Option<Category>, DomainError>;
    fn delete(&self, id: i64) -> Result<bool, DomainError>;
}

pub trait ReviewRepository: Send + Sync + 'static {
    fn find_by_id(&self, id: i64) -> Result<Option<ReviewView>, DomainError>;
    fn list(&self, filters: &ReviewFilters) -> Result<(Vec<ReviewView>, i64), DomainError>;
    fn create(&self, review: &NewReview) -> Result<ReviewView, DomainError>;
    fn update(&self, id: i64, changes: &ReviewChanges) -> Result<Option<ReviewView>, DomainError>;
    fn delete(&self, id: i64) -> Result<bool, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    /// The user's cart with every line joined to its live product row.
    fn find_by_user(&self, user_id: i64) -> Result<Option<Cart>, DomainError>;
    /// Creates the user's cart, or returns the one a concurrent call created.
    fn create(&self, user_id: i64) -> Result<Cart, DomainError>;
    /// Adds `quantity` to the line, inserting it if absent.
    fn add_item(&self, cart_id: i64, product_id: i64, quantity: i32) -> Result<(), DomainError>;
    /// Replaces the line quantity. `Ok(false)` when the line does not exist.
    fn update_item(&self, cart_id: i64, product_id: i64, quantity: i32)
        -> Result<bool, DomainError>;
    fn remove_item(&self, cart_id: i64, product_id: i64) -> Result<bool, DomainError>;
    fn clear(&self, cart_id: i64) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Persists order header, items, cart clear and stock reservation
    /// atomically. Any error leaves no trace of the order.
    fn place(&self, order: PlaceOrder) -> Result<Order, DomainError>;
    fn find_by_id(&self, order_id: i64) -> Result<Option<Order>, DomainError>;
    fn find_for_user(&self, order_id: i64, user_id: i64) -> Result<Option<Order>, DomainError>;
    fn list_for_user(&self, user_id: i64, filters: &OrderFilters)
        -> Result<OrderPage, DomainError>;
    fn list_all(&self, filters: &AdminOrderFilters) -> Result<OrderPage, DomainError>;
    /// Unconditional write. `Ok(false)` when the order does not exist.
    fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<bool, DomainError>;
    /// Conditional write: only flips orders still in a cancellable state,
    /// and only the caller's own when `user_id` is given. `Ok(false)` means
    /// zero rows matched.
    fn cancel(&self, order_id: i64, user_id: Option<i64>) -> Result<bool, DomainError>;
}

/// Lookups owned by the account collaborator.
pub trait UserDirectory: Send + Sync + 'static {
    fn find_user(&self, id: i64) -> Result<Option<User>, DomainError>;
    fn find_address(&self, id: i64) -> Result<Option<Address>, DomainError>;
}
