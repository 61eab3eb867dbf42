use dotenvy::dotenv;
use shop_core::config::Config;
use shop_core::infrastructure::redis_cache::create_redis_pool;
use shop_core::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let pool = create_pool(&config.database_url, config.db_pool_size).map_err(|e| {
        log::error!("Could not connect to PostgreSQL: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
    })?;
    run_migrations(&pool).map_err(|e| std::io::Error::other(e.to_string()))?;

    // Redis is optional at boot; reads fall back to PostgreSQL until it is reachable.
    let redis = create_redis_pool(
        &config.redis_url,
        config.redis_pool_size,
        config.redis_timeout,
    )
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    log::info!(
        "Starting server at http://{}:{} (checkout policy {:?})",
        config.host,
        config.port,
        config.checkout_policy
    );

    let state = AppState::new(pool, redis, config.checkout_policy, config.cache_ttls);
    build_server(state, &config.host, config.port)?.await
}
