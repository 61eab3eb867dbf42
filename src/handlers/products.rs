use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::catalog::{CategorySummary, NewProduct, ProductChanges, ProductPage, ProductView};
use crate::domain::filters::{ProductFilters, ProductSort, SortOrder};
use crate::errors::AppError;
use crate::AppState;

use super::{decimal, optional_decimal, Admin};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    /// Decimal price as a string, e.g. "19.99"
    pub price: String,
    pub stock: i32,
    pub category_ids: Vec<i64>,
}

/// Omitted fields are left untouched; `category_ids` replaces the set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub stock: Option<i32>,
    pub category_ids: Option<Vec<i64>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub stock: i32,
    pub categories: Vec<CategoryRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductView> for ProductResponse {
    fn from(p: ProductView) -> Self {
        Self {
            id: p.id,
            uuid: p.uuid,
            name: p.name,
            description: p.description,
            price: p.price.to_string(),
            stock: p.stock,
            categories: p
                .categories
                .into_iter()
                .map(|CategorySummary { id, name }| CategoryRef { id, name })
                .collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductPageResponse {
    pub items: Vec<ProductResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl From<ProductPage> for ProductPageResponse {
    fn from(page: ProductPage) -> Self {
        Self {
            items: page.items.into_iter().map(ProductResponse::from).collect(),
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListProductsParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category_id: Option<i64>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort_by: Option<ProductSort>,
    pub sort_order: Option<SortOrder>,
}

impl ListProductsParams {
    fn into_filters(self) -> Result<ProductFilters, AppError> {
        let defaults = ProductFilters::default();
        Ok(ProductFilters {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
            category_id: self.category_id,
            min_price: optional_decimal("min_price", self.min_price.as_deref())?,
            max_price: optional_decimal("max_price", self.max_price.as_deref())?,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        })
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("category_id" = Option<i64>, Query, description = "Only products in this category"),
        ("min_price" = Option<String>, Query, description = "Inclusive lower price bound"),
        ("max_price" = Option<String>, Query, description = "Inclusive upper price bound"),
        ("sort_by" = Option<String>, Query, description = "created_at | price | name"),
        ("sort_order" = Option<String>, Query, description = "asc | desc (default desc)"),
    ),
    responses(
        (status = 200, description = "Page of products", body = ProductPageResponse),
        (status = 400, description = "Malformed query"),
        (status = 422, description = "Inconsistent price range"),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let filters = query.into_inner().into_filters()?;
    let page = web::block(move || state.products.list(filters)).await??;
    Ok(HttpResponse::Ok().json(ProductPageResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = web::block(move || state.products.get(id)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "A category does not exist"),
        (status = 422, description = "Invalid product data"),
    ),
    tag = "catalog"
)]
pub async fn create_product(
    _admin: Admin,
    state: web::Data<AppState>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let product = NewProduct {
        price: decimal("price", &body.price)?,
        name: body.name,
        description: body.description,
        stock: body.stock,
        category_ids: body.category_ids,
    };
    let created = web::block(move || state.products.create(product)).await??;
    Ok(HttpResponse::Created().json(ProductResponse::from(created)))
}

#[utoipa::path(
    patch,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Product or category not found"),
        (status = 422, description = "Invalid product data"),
    ),
    tag = "catalog"
)]
pub async fn update_product(
    _admin: Admin,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let changes = ProductChanges {
        price: optional_decimal("price", body.price.as_deref())?,
        name: body.name,
        description: body.description,
        stock: body.stock,
        category_ids: body.category_ids,
    };
    let updated = web::block(move || state.products.update(id, changes)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_product(
    _admin: Admin,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.products.delete(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}
