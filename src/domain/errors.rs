use thiserror::Error;

/// Coarse classification used by adapters to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Authorization,
    Internal,
}

#[derive(Debug, Error)]
pub enum DomainError {
    // ── not found ────────────────────────────────────────────────────────────
    #[error("Cart not found")]
    CartNotFound,
    #[error("Cart item not found")]
    CartItemNotFound,
    #[error("Order not found")]
    OrderNotFound,
    #[error("Product not found")]
    ProductNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Address not found")]
    AddressNotFound,
    #[error("Category not found")]
    CategoryNotFound,
    #[error("Review not found")]
    ReviewNotFound,

    // ── validation ───────────────────────────────────────────────────────────
    #[error("Quantity must be greater than 0")]
    InvalidQuantity,
    #[error("Invalid order status: {0}")]
    InvalidOrderStatus(String),
    #[error("Invalid order data: {0}")]
    InvalidOrderData(String),
    #[error("Invalid product data: {0}")]
    InvalidProductData(String),
    #[error("Invalid category data: {0}")]
    InvalidCategoryData(String),
    #[error("Invalid review data: {0}")]
    InvalidReviewData(String),
    #[error("Nothing to update")]
    NothingToUpdate,
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── conflict ─────────────────────────────────────────────────────────────
    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: i64 },
    #[error("Cart is empty")]
    CartEmpty,
    #[error("Cart changed during checkout")]
    CartChanged,
    #[error("Order is already cancelled")]
    OrderAlreadyCancelled,
    #[error("Order cannot be cancelled")]
    OrderCannotBeCancelled,
    #[error("Category name already exists")]
    CategoryNameExists,

    // ── authorization ────────────────────────────────────────────────────────
    #[error("Access forbidden")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::CartNotFound
            | DomainError::CartItemNotFound
            | DomainError::OrderNotFound
            | DomainError::ProductNotFound
            | DomainError::UserNotFound
            | DomainError::AddressNotFound
            | DomainError::CategoryNotFound
            | DomainError::ReviewNotFound => ErrorKind::NotFound,
            DomainError::InvalidQuantity
            | DomainError::InvalidOrderStatus(_)
            | DomainError::InvalidOrderData(_)
            | DomainError::InvalidProductData(_)
            | DomainError::InvalidCategoryData(_)
            | DomainError::InvalidReviewData(_)
            | DomainError::NothingToUpdate
            | DomainError::InvalidInput(_) => ErrorKind::Validation,
            DomainError::InsufficientStock { .. }
            | DomainError::CartEmpty
            | DomainError::CartChanged
            | DomainError::OrderAlreadyCancelled
            | DomainError::OrderCannotBeCancelled
            | DomainError::CategoryNameExists => ErrorKind::Conflict,
            DomainError::Forbidden => ErrorKind::Authorization,
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }
}
