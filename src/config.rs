use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheTtls;
use crate::domain::order::CheckoutPolicy;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub host: String,
    pub port: u16,
    pub db_pool_size: u32,
    pub redis_pool_size: u32,
    pub redis_timeout: Duration,
    pub checkout_policy: CheckoutPolicy,
    pub cache_ttls: CacheTtls,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a local `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CacheTtls::default();
        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 8080)?,
            db_pool_size: positive(&lookup, "DB_POOL_SIZE", 10)?,
            redis_pool_size: positive(&lookup, "REDIS_POOL_SIZE", 10)?,
            redis_timeout: Duration::from_millis(parsed(&lookup, "REDIS_TIMEOUT_MS", 250)?),
            checkout_policy: parsed(&lookup, "CHECKOUT_POLICY", CheckoutPolicy::default())?,
            cache_ttls: CacheTtls {
                product: seconds(&lookup, "CACHE_TTL_PRODUCT_SECS", defaults.product)?,
                product_list: seconds(
                    &lookup,
                    "CACHE_TTL_PRODUCT_LIST_SECS",
                    defaults.product_list,
                )?,
                category: seconds(&lookup, "CACHE_TTL_CATEGORY_SECS", defaults.category)?,
                review: seconds(&lookup, "CACHE_TTL_REVIEW_SECS", defaults.review)?,
                review_list: seconds(&lookup, "CACHE_TTL_REVIEW_SECS", defaults.review_list)?,
            },
        })
    }
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive<F>(lookup: &F, name: &'static str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parsed(lookup, name, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
            reason: "must be greater than 0".to_string(),
        }),
        n => Ok(n),
    }
}

fn seconds<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parsed(lookup, name, default.as_secs())? {
        0 => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
            reason: "a TTL must be at least one second".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_database_is_set() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/shop")]).expect("config");

        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_pool_size, 10);
        assert_eq!(config.redis_timeout, Duration::from_millis(250));
        assert_eq!(config.checkout_policy, CheckoutPolicy::ReserveStock);
        assert_eq!(config.cache_ttls, CacheTtls::default());
    }

    #[test]
    fn database_url_is_required() {
        assert_eq!(config(&[]), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config(&[
            ("DATABASE_URL", "postgres://db/shop"),
            ("PORT", "9090"),
            ("CHECKOUT_POLICY", "check-only"),
            ("CACHE_TTL_PRODUCT_SECS", "30"),
            ("CACHE_TTL_REVIEW_SECS", "12"),
        ])
        .expect("config");

        assert_eq!(config.port, 9090);
        assert_eq!(config.checkout_policy, CheckoutPolicy::CheckOnly);
        assert_eq!(config.cache_ttls.product, Duration::from_secs(30));
        assert_eq!(config.cache_ttls.review, Duration::from_secs(12));
        assert_eq!(config.cache_ttls.review_list, Duration::from_secs(12));
        assert_eq!(config.cache_ttls.category, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config(&[("DATABASE_URL", "x"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = config(&[("DATABASE_URL", "x"), ("CHECKOUT_POLICY", "yolo")]).unwrap_err();
        assert!(err.to_string().contains("CHECKOUT_POLICY"));

        let err = config(&[("DATABASE_URL", "x"), ("DB_POOL_SIZE", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DB_POOL_SIZE", .. }));

        let err = config(&[("DATABASE_URL", "x"), ("CACHE_TTL_CATEGORY_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CACHE_TTL_CATEGORY_SECS", .. }));
    }
}
