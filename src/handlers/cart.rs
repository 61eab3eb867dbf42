use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::cart::CartView;
use crate::errors::AppError;
use crate::AppState;

use super::Caller;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    /// Current product price
    pub price: String,
    pub subtotal: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<CartLineResponse>,
    pub total_price: String,
    pub total_items: i64,
}

impl From<CartView> for CartResponse {
    fn from(cart: CartView) -> Self {
        Self {
            id: cart.id,
            user_id: cart.user_id,
            items: cart
                .items
                .into_iter()
                .map(|line| CartLineResponse {
                    product_id: line.product_id,
                    product_name: line.product_name,
                    quantity: line.quantity,
                    price: line.price.to_string(),
                    subtotal: line.subtotal.to_string(),
                })
                .collect(),
            total_price: cart.total_price.to_string(),
            total_items: cart.total_items,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "The caller's cart, created on first access", body = CartResponse),
        (status = 401, description = "Missing caller"),
    ),
    tag = "cart"
)]
pub async fn get_cart(caller: Caller, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || state.carts.get(caller.user_id)).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Not enough stock"),
        (status = 422, description = "Quantity must be positive"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    caller: Caller,
    state: web::Data<AppState>,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let AddItemRequest {
        product_id,
        quantity,
    } = body.into_inner();
    let cart =
        web::block(move || state.carts.add_item(caller.user_id, product_id, quantity)).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

#[utoipa::path(
    put,
    path = "/api/cart/items/{product_id}",
    params(("product_id" = i64, Path, description = "Product id of the line")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "No such line in the cart"),
        (status = 409, description = "Not enough stock"),
    ),
    tag = "cart"
)]
pub async fn update_item(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    let cart = web::block(move || state.carts.update_item(caller.user_id, product_id, quantity))
        .await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    params(("product_id" = i64, Path, description = "Product id of the line")),
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "No such line in the cart"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let cart = web::block(move || state.carts.remove_item(caller.user_id, product_id)).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses((status = 200, description = "Emptied cart", body = CartResponse)),
    tag = "cart"
)]
pub async fn clear_cart(
    caller: Caller,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || state.carts.clear(caller.user_id)).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}
