use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Order lifecycle. `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// States from which a cancel is allowed.
    pub const CANCELLABLE: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Paid];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn is_cancellable(self) -> bool {
        Self::CANCELLABLE.contains(&self)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidOrderStatus(s.to_string()))
    }
}

/// Immutable snapshot of a cart line at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub price_at_order: BigDecimal,
    pub quantity: i32,
}

impl OrderItem {
    pub fn subtotal(&self) -> BigDecimal {
        self.price_at_order.clone() * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub address_id: Option<i64>,
    pub total_price: BigDecimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub price_at_order: BigDecimal,
    pub quantity: i32,
}

/// Stock handling inside the checkout transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPolicy {
    /// Re-validate and decrement stock per line; a short line aborts the order.
    #[default]
    ReserveStock,
    /// Trust the check made when the cart was mutated.
    CheckOnly,
}

impl FromStr for CheckoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserve" => Ok(CheckoutPolicy::ReserveStock),
            "check-only" => Ok(CheckoutPolicy::CheckOnly),
            other => Err(format!("unknown checkout policy '{other}'")),
        }
    }
}

/// Everything the order store must persist as one unit: the order header,
/// its items, the cart clear and (optionally) the stock reservation.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: i64,
    pub address_id: Option<i64>,
    pub cart_id: i64,
    pub total_price: BigDecimal,
    pub items: Vec<NewOrderItem>,
    pub policy: CheckoutPolicy,
}

impl PlaceOrder {
    /// `(product_id, quantity)` per item, in product id order.
    pub fn lines(&self) -> Vec<(i64, i32)> {
        let mut lines: Vec<(i64, i32)> = self
            .items
            .iter()
            .map(|item| (item.product_id, item.quantity))
            .collect();
        lines.sort_unstable();
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPage {
    pub items: Vec<Order>,
    pub total: i64,
    pub total_amount: BigDecimal,
    pub page: i64,
    pub limit: i64,
}
