use std::str::FromStr;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::filters::{OrderFilters, OrderSort, SortOrder};
use crate::domain::order::{Order, OrderItem, OrderPage, OrderStatus};
use crate::errors::AppError;
use crate::AppState;

use super::{optional_decimal, Caller};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Shipping address; must belong to the caller.
    pub address_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    /// Unit price captured at checkout
    pub price_at_order: String,
    pub quantity: i32,
    pub subtotal: String,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            subtotal: item.subtotal().to_string(),
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            price_at_order: item.price_at_order.to_string(),
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub address_id: Option<i64>,
    pub status: String,
    pub total_price: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            uuid: o.uuid,
            user_id: o.user_id,
            address_id: o.address_id,
            status: o.status.to_string(),
            total_price: o.total_price.to_string(),
            created_at: o.created_at,
            updated_at: o.updated_at,
            items: o.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPageResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    /// Sum of `total_price` over this page
    pub total_amount: String,
    pub page: i64,
    pub limit: i64,
}

impl From<OrderPage> for OrderPageResponse {
    fn from(page: OrderPage) -> Self {
        Self {
            items: page.items.into_iter().map(OrderResponse::from).collect(),
            total: page.total,
            total_amount: page.total_amount.to_string(),
            page: page.page,
            limit: page.limit,
        }
    }
}

// ── Pagination and filters ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub sort_by: Option<OrderSort>,
    pub sort_order: Option<SortOrder>,
    /// Honored on the admin listing only.
    pub user_id: Option<i64>,
}

impl ListOrdersParams {
    pub(crate) fn into_filters(self) -> Result<OrderFilters, AppError> {
        let defaults = OrderFilters::default();
        let status = self
            .status
            .as_deref()
            .map(OrderStatus::from_str)
            .transpose()?;
        Ok(OrderFilters {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
            status,
            date_from: self.date_from,
            date_to: self.date_to,
            min_amount: optional_decimal("min_amount", self.min_amount.as_deref())?,
            max_amount: optional_decimal("max_amount", self.max_amount.as_deref())?,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        })
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/orders
///
/// Checks out the caller's cart. The order, its price snapshot, the stock
/// reservation and the cart clear commit together or not at all.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 401, description = "Missing caller"),
        (status = 404, description = "User or address not found"),
        (status = 409, description = "Cart empty or stock insufficient"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    caller: Caller,
    state: web::Data<AppState>,
    body: Option<web::Json<CreateOrderRequest>>,
) -> Result<HttpResponse, AppError> {
    let address_id = body.map(|b| b.into_inner()).unwrap_or_default().address_id;
    let order =
        web::block(move || state.checkout.create_order(caller.user_id, address_id)).await??;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /api/orders
///
/// The caller's orders with their items.
#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
        ("status" = Option<String>, Query, description = "pending | paid | shipped | delivered | cancelled"),
        ("date_from" = Option<String>, Query, description = "RFC 3339 lower bound on created_at"),
        ("date_to" = Option<String>, Query, description = "RFC 3339 upper bound on created_at"),
        ("min_amount" = Option<String>, Query, description = "Lower bound on total_price"),
        ("max_amount" = Option<String>, Query, description = "Upper bound on total_price"),
        ("sort_by" = Option<String>, Query, description = "created_at | updated_at | total_price | status"),
        ("sort_order" = Option<String>, Query, description = "asc | desc (default desc)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = OrderPageResponse),
        (status = 422, description = "Invalid filter"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    caller: Caller,
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let filters = query.into_inner().into_filters()?;
    let page =
        web::block(move || state.orders.list_user_orders(caller.user_id, filters)).await??;
    Ok(HttpResponse::Ok().json(OrderPageResponse::from(page)))
}

/// GET /api/orders/{id}
///
/// Another user's order is reported as not found.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let order = web::block(move || state.orders.get_order(caller.user_id, order_id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Already cancelled or past the cancellable states"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let order =
        web::block(move || state.orders.cancel_order(caller.user_id, order_id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
