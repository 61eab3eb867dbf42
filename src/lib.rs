pub mod application;
pub mod cache;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::cart_service::CartService;
use application::category_service::CategoryService;
use application::checkout::CheckoutService;
use application::order_service::OrderService;
use application::product_service::ProductService;
use application::read_cache::ReadCache;
use application::review_service::ReviewService;
use cache::CacheTtls;
use domain::errors::DomainError;
use domain::order::CheckoutPolicy;
use infrastructure::cart_repo::DieselCartRepository;
use infrastructure::category_repo::DieselCategoryRepository;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::product_repo::DieselProductRepository;
use infrastructure::redis_cache::{RedisCache, RedisPool};
use infrastructure::review_repo::DieselReviewRepository;
use infrastructure::user_directory::DieselUserDirectory;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DomainError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::Internal(format!("migrations failed: {e}")))?;
    for version in applied {
        log::info!("Applied migration {}", version);
    }
    Ok(())
}

/// Services wired to PostgreSQL and Redis, shared by every worker.
pub struct AppState {
    pub products: ProductService<DieselProductRepository, DieselCategoryRepository, RedisCache>,
    pub categories: CategoryService<DieselCategoryRepository, RedisCache>,
    pub reviews: ReviewService<DieselReviewRepository, RedisCache>,
    pub carts: CartService<DieselCartRepository, DieselProductRepository>,
    pub checkout: CheckoutService<
        DieselCartRepository,
        DieselOrderRepository,
        DieselUserDirectory,
        RedisCache,
    >,
    pub orders: OrderService<DieselOrderRepository>,
}

impl AppState {
    pub fn new(
        db: DbPool,
        redis: RedisPool,
        policy: CheckoutPolicy,
        ttls: CacheTtls,
    ) -> Self {
        let cache = ReadCache::new(RedisCache::new(redis));
        let products = DieselProductRepository::new(db.clone());
        let categories = DieselCategoryRepository::new(db.clone());
        let carts = DieselCartRepository::new(db.clone());
        let orders = DieselOrderRepository::new(db.clone());

        Self {
            products: ProductService::new(
                products.clone(),
                categories.clone(),
                cache.clone(),
                ttls,
            ),
            categories: CategoryService::new(categories, cache.clone(), ttls),
            reviews: ReviewService::new(
                DieselReviewRepository::new(db.clone()),
                cache.clone(),
                ttls,
            ),
            carts: CartService::new(carts.clone(), products),
            checkout: CheckoutService::new(
                carts,
                orders.clone(),
                DieselUserDirectory::new(db),
                cache,
                policy,
            ),
            orders: OrderService::new(orders),
        }
    }
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = handlers::ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
