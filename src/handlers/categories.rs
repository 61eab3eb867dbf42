use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::catalog::{CategoryChanges, CategoryList, CategoryView, NewCategory};
use crate::errors::AppError;
use crate::AppState;

use super::Admin;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub product_count: i64,
}

impl From<CategoryView> for CategoryResponse {
    fn from(c: CategoryView) -> Self {
        Self {
            id: c.id,
            uuid: c.uuid,
            name: c.name,
            description: c.description,
            product_count: c.product_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryListResponse {
    pub items: Vec<CategoryResponse>,
    pub total: i64,
}

impl From<CategoryList> for CategoryListResponse {
    fn from(list: CategoryList) -> Self {
        Self {
            items: list.items.into_iter().map(CategoryResponse::from).collect(),
            total: list.total,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "All categories", body = CategoryListResponse)),
    tag = "catalog"
)]
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let list = web::block(move || state.categories.list_all()).await??;
    Ok(HttpResponse::Ok().json(CategoryListResponse::from(list)))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category found", body = CategoryResponse),
        (status = 404, description = "Category not found"),
    ),
    tag = "catalog"
)]
pub async fn get_category(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let category = web::block(move || state.categories.get(id)).await??;
    Ok(HttpResponse::Ok().json(CategoryResponse::from(category)))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Name already taken"),
        (status = 422, description = "Invalid category data"),
    ),
    tag = "catalog"
)]
pub async fn create_category(
    _admin: Admin,
    state: web::Data<AppState>,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let category = NewCategory {
        name: body.name,
        description: body.description,
    };
    let created = web::block(move || state.categories.create(category)).await??;
    Ok(HttpResponse::Created().json(CategoryResponse::from(created)))
}

#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Name already taken"),
    ),
    tag = "catalog"
)]
pub async fn update_category(
    _admin: Admin,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let changes = CategoryChanges {
        name: body.name,
        description: body.description,
    };
    let updated = web::block(move || state.categories.update(id, changes)).await??;
    Ok(HttpResponse::Ok().json(CategoryResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Category not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_category(
    _admin: Admin,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.categories.delete(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}
