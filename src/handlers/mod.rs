//! actix-web adapter. Handlers parse the request, run the service call on
//! the blocking pool and shape the response; all rules live in the services.
//!
//! Authentication happens upstream. The gateway forwards the caller as
//! `X-User-Id` and, for staff, `X-User-Role: admin`.

pub mod admin;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod reviews;

use std::future::{ready, Ready};
use std::str::FromStr;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use bigdecimal::BigDecimal;
use utoipa::OpenApi;

use crate::domain::errors::DomainError;
use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const ROLE_HEADER: &str = "X-User-Role";

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
}

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(caller_from(req))
    }
}

fn caller_from(req: &HttpRequest) -> Result<Caller, AppError> {
    let raw = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;
    let user_id = raw
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::Unauthorized(format!("malformed {USER_ID_HEADER} header")))?;
    Ok(Caller { user_id })
}

/// A caller holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl FromRequest for Admin {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let is_admin = req
            .headers()
            .get(ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|role| role.eq_ignore_ascii_case("admin"));
        ready(if is_admin {
            Ok(Admin)
        } else {
            Err(DomainError::Forbidden.into())
        })
    }
}

/// Money travels as strings, e.g. `"9.99"`.
pub(crate) fn decimal(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|e| AppError::BadRequest(format!("invalid {field} '{raw}': {e}")))
}

pub(crate) fn optional_decimal(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<BigDecimal>, AppError> {
    raw.map(|r| decimal(field, r)).transpose()
}

/// Registers every route under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/products")
                    .route("", web::get().to(products::list_products))
                    .route("", web::post().to(products::create_product))
                    .route("/{id}", web::get().to(products::get_product))
                    .route("/{id}", web::patch().to(products::update_product))
                    .route("/{id}", web::delete().to(products::delete_product)),
            )
            .service(
                web::scope("/categories")
                    .route("", web::get().to(categories::list_categories))
                    .route("", web::post().to(categories::create_category))
                    .route("/{id}", web::get().to(categories::get_category))
                    .route("/{id}", web::patch().to(categories::update_category))
                    .route("/{id}", web::delete().to(categories::delete_category)),
            )
            .service(
                web::scope("/reviews")
                    .route("", web::get().to(reviews::list_reviews))
                    .route("", web::post().to(reviews::create_review))
                    .route("/{id}", web::get().to(reviews::get_review))
                    .route("/{id}", web::patch().to(reviews::update_review))
                    .route("/{id}", web::delete().to(reviews::delete_review)),
            )
            .service(
                web::scope("/cart")
                    .route("", web::get().to(cart::get_cart))
                    .route("", web::delete().to(cart::clear_cart))
                    .route("/items", web::post().to(cart::add_item))
                    .route("/items/{product_id}", web::put().to(cart::update_item))
                    .route("/items/{product_id}", web::delete().to(cart::remove_item)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::get().to(orders::list_orders))
                    .route("", web::post().to(orders::create_order))
                    .route("/{id}", web::get().to(orders::get_order))
                    .route("/{id}/cancel", web::post().to(orders::cancel_order)),
            )
            .service(
                web::scope("/admin/orders")
                    .route("", web::get().to(admin::list_all_orders))
                    .route("/{id}/status", web::put().to(admin::update_order_status)),
            ),
    );
}

#[derive(OpenApi)]
#[openapi(
    paths(
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        reviews::list_reviews,
        reviews::get_review,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        admin::list_all_orders,
        admin::update_order_status,
    ),
    components(schemas(
        products::ProductResponse,
        products::CategoryRef,
        products::ProductPageResponse,
        products::CreateProductRequest,
        products::UpdateProductRequest,
        categories::CategoryResponse,
        categories::CategoryListResponse,
        categories::CreateCategoryRequest,
        categories::UpdateCategoryRequest,
        reviews::ReviewResponse,
        reviews::ReviewPageResponse,
        reviews::CreateReviewRequest,
        reviews::UpdateReviewRequest,
        cart::CartResponse,
        cart::CartLineResponse,
        cart::AddItemRequest,
        cart::UpdateItemRequest,
        orders::OrderResponse,
        orders::OrderItemResponse,
        orders::OrderPageResponse,
        orders::CreateOrderRequest,
        admin::UpdateStatusRequest,
    )),
    tags(
        (name = "catalog", description = "Products, categories and reviews"),
        (name = "cart", description = "The caller's shopping cart"),
        (name = "orders", description = "Checkout and order history"),
        (name = "admin", description = "Order administration"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::ResponseError;

    fn caller(req: TestRequest) -> Result<Caller, AppError> {
        caller_from(&req.to_http_request())
    }

    #[test]
    fn caller_comes_from_the_user_header() {
        let c = caller(TestRequest::default().insert_header((USER_ID_HEADER, "42"))).expect("caller");
        assert_eq!(c.user_id, 42);
    }

    #[test]
    fn missing_or_malformed_caller_is_unauthorized() {
        for req in [
            TestRequest::default(),
            TestRequest::default().insert_header((USER_ID_HEADER, "abc")),
            TestRequest::default().insert_header((USER_ID_HEADER, "-1")),
        ] {
            let err = caller(req).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[actix_web::test]
    async fn admin_requires_the_role_header() {
        let (req, mut payload) = TestRequest::default()
            .insert_header((ROLE_HEADER, "Admin"))
            .to_http_parts();
        assert!(Admin::from_request(&req, &mut payload).await.is_ok());

        let (req, mut payload) = TestRequest::default()
            .insert_header((ROLE_HEADER, "customer"))
            .to_http_parts();
        let err = Admin::from_request(&req, &mut payload).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn decimals_are_parsed_or_rejected() {
        assert_eq!(
            decimal("price", " 9.99 ").expect("decimal"),
            BigDecimal::from_str("9.99").expect("decimal")
        );
        let err = decimal("price", "nine").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(optional_decimal("min_price", None).expect("none"), None);
    }

    #[test]
    fn openapi_lists_the_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/orders"));
        assert!(doc.paths.paths.contains_key("/api/admin/orders/{id}/status"));
    }
}
