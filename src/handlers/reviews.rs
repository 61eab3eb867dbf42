use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::filters::{ReviewFilters, ReviewSort, SortOrder};
use crate::domain::review::{NewReview, ReviewChanges, ReviewPage, ReviewView};
use crate::errors::AppError;
use crate::AppState;

use super::Caller;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub product_id: i64,
    /// 1 to 5
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i64,
    pub uuid: Uuid,
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReviewView> for ReviewResponse {
    fn from(r: ReviewView) -> Self {
        Self {
            id: r.id,
            uuid: r.uuid,
            product_id: r.product_id,
            user_id: r.user_id,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewPageResponse {
    pub items: Vec<ReviewResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl From<ReviewPage> for ReviewPageResponse {
    fn from(page: ReviewPage) -> Self {
        Self {
            items: page.items.into_iter().map(ReviewResponse::from).collect(),
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListReviewsParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub product_id: Option<i64>,
    pub user_id: Option<i64>,
    pub rating: Option<i16>,
    pub sort_by: Option<ReviewSort>,
    pub sort_order: Option<SortOrder>,
}

impl From<ListReviewsParams> for ReviewFilters {
    fn from(p: ListReviewsParams) -> Self {
        let defaults = ReviewFilters::default();
        ReviewFilters {
            page: p.page.unwrap_or(defaults.page),
            limit: p.limit.unwrap_or(defaults.limit),
            product_id: p.product_id,
            user_id: p.user_id,
            rating: p.rating,
            sort_by: p.sort_by.unwrap_or_default(),
            sort_order: p.sort_order.unwrap_or_default(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("product_id" = Option<i64>, Query, description = "Reviews of this product"),
        ("user_id" = Option<i64>, Query, description = "Reviews by this user"),
        ("rating" = Option<i16>, Query, description = "Exact star rating"),
        ("sort_by" = Option<String>, Query, description = "created_at | rating"),
        ("sort_order" = Option<String>, Query, description = "asc | desc (default desc)"),
    ),
    responses(
        (status = 200, description = "Page of reviews", body = ReviewPageResponse),
        (status = 422, description = "Rating filter out of range"),
    ),
    tag = "catalog"
)]
pub async fn list_reviews(
    state: web::Data<AppState>,
    query: web::Query<ListReviewsParams>,
) -> Result<HttpResponse, AppError> {
    let filters = ReviewFilters::from(query.into_inner());
    let page = web::block(move || state.reviews.list(filters)).await??;
    Ok(HttpResponse::Ok().json(ReviewPageResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/reviews/{id}",
    params(("id" = i64, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review found", body = ReviewResponse),
        (status = 404, description = "Review not found"),
    ),
    tag = "catalog"
)]
pub async fn get_review(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let review = web::block(move || state.reviews.get(id)).await??;
    Ok(HttpResponse::Ok().json(ReviewResponse::from(review)))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 401, description = "Missing caller"),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Invalid review data"),
    ),
    tag = "catalog"
)]
pub async fn create_review(
    caller: Caller,
    state: web::Data<AppState>,
    body: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let review = NewReview {
        product_id: body.product_id,
        user_id: caller.user_id,
        rating: body.rating,
        comment: body.comment,
    };
    let created = web::block(move || state.reviews.create(review)).await??;
    Ok(HttpResponse::Created().json(ReviewResponse::from(created)))
}

#[utoipa::path(
    patch,
    path = "/api/reviews/{id}",
    params(("id" = i64, Path, description = "Review id")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Review not found"),
        (status = 422, description = "Invalid review data"),
    ),
    tag = "catalog"
)]
pub async fn update_review(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let changes = ReviewChanges {
        rating: body.rating,
        comment: body.comment,
    };
    let updated =
        web::block(move || state.reviews.update(caller.user_id, id, changes)).await??;
    Ok(HttpResponse::Ok().json(ReviewResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = i64, Path, description = "Review id")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Review not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_review(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.reviews.delete(caller.user_id, id)).await??;
    Ok(HttpResponse::NoContent().finish())
}
