use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::filters::AdminOrderFilters;
use crate::errors::AppError;
use crate::AppState;

use super::orders::{ListOrdersParams, OrderPageResponse, OrderResponse};
use super::Admin;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// pending | paid | shipped | delivered | cancelled
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("user_id" = Option<i64>, Query, description = "Only this user's orders"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
        ("status" = Option<String>, Query, description = "Order status"),
        ("sort_by" = Option<String>, Query, description = "created_at | updated_at | total_price | status"),
        ("sort_order" = Option<String>, Query, description = "asc | desc (default desc)"),
    ),
    responses(
        (status = 200, description = "Orders across all users", body = OrderPageResponse),
        (status = 403, description = "Caller is not an admin"),
    ),
    tag = "admin"
)]
pub async fn list_all_orders(
    _admin: Admin,
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let user_id = params.user_id;
    let filters = AdminOrderFilters {
        orders: params.into_filters()?,
        user_id,
    };
    let page = web::block(move || state.orders.list_all_orders(filters)).await??;
    Ok(HttpResponse::Ok().json(OrderPageResponse::from(page)))
}

/// PUT /api/admin/orders/{id}/status
///
/// Any status may be set directly except `cancelled`, which still has to
/// pass the pending/paid guard.
#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/status",
    params(("id" = i64, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Cancel refused by the order's state"),
        (status = 422, description = "Unknown status"),
    ),
    tag = "admin"
)]
pub async fn update_order_status(
    _admin: Admin,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    let order = web::block(move || state.orders.update_status(order_id, &status)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
