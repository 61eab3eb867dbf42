//! Read-cache plumbing: the store port, TTL classes and key layout.
//!
//! Nothing stored here is authoritative. Every entry can be rebuilt from
//! PostgreSQL, so every failure in this layer is logged and swallowed by
//! [`crate::application::read_cache::ReadCache`].

pub mod keys;

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache command failed: {0}")]
    Command(String),
    #[error("cache payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key/value store with per-entry expiry.
pub trait CacheStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    fn delete(&self, keys: &[String]) -> Result<(), CacheError>;
    /// Deletes every key matching a glob `pattern`; returns how many went.
    fn delete_matching(&self, pattern: &str) -> Result<usize, CacheError>;
}

/// Expiry per entity class. Higher churn gets a shorter life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub product: Duration,
    pub product_list: Duration,
    pub category: Duration,
    pub review: Duration,
    pub review_list: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            product: Duration::from_secs(60 * 60),
            product_list: Duration::from_secs(15 * 60),
            category: Duration::from_secs(24 * 60 * 60),
            review: Duration::from_secs(5 * 60),
            review_list: Duration::from_secs(5 * 60),
        }
    }
}
