use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::catalog::Product;

/// A user's staging area. Lines carry the live product row they point at,
/// so price and stock are always current when the cart is read.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<CartLine>,
}

#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
}

impl CartLine {
    pub fn subtotal(&self) -> BigDecimal {
        self.product.price.clone() * BigDecimal::from(self.quantity)
    }
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_price(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::from(0), |acc, line| acc + line.subtotal())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLineView {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub subtotal: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<CartLineView>,
    pub total_price: BigDecimal,
    pub total_items: i64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let items = cart
            .lines
            .iter()
            .map(|line| CartLineView {
                product_id: line.product.id,
                product_name: line.product.name.clone(),
                quantity: line.quantity,
                price: line.product.price.clone(),
                subtotal: line.subtotal(),
            })
            .collect();
        CartView {
            id: cart.id,
            user_id: cart.user_id,
            items,
            total_price: cart.total_price(),
            total_items: cart.lines.iter().map(|l| i64::from(l.quantity)).sum(),
        }
    }
}
