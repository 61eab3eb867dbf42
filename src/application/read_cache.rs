use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheError, CacheStore};
use crate::domain::errors::DomainError;

/// Cache-aside over a [`CacheStore`].
///
/// Reads degrade to the loader on any cache failure; writes and
/// invalidations never fail the caller. A failed invalidation is logged as
/// a consistency risk because the stale entry lives until its TTL.
#[derive(Clone)]
pub struct ReadCache<C> {
    store: C,
}

impl<C: CacheStore> ReadCache<C> {
    pub fn new(store: C) -> Self {
        Self { store }
    }

    pub fn get_or_load<T, F>(&self, key: &str, ttl: Duration, load: F) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, DomainError>,
    {
        if let Some(hit) = self.lookup(key) {
            return Ok(hit);
        }
        let value = load()?;
        self.put(key, &value, ttl);
        Ok(value)
    }

    /// Same as [`get_or_load`](Self::get_or_load) for keys that had to be
    /// derived (filter fingerprints). A key that cannot be built bypasses
    /// the cache entirely.
    pub fn get_or_load_keyed<T, F>(
        &self,
        key: Result<String, CacheError>,
        ttl: Duration,
        load: F,
    ) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, DomainError>,
    {
        match key {
            Ok(key) => self.get_or_load(&key, ttl, load),
            Err(e) => {
                log::warn!("Could not build cache key, reading from store: {}", e);
                load()
            }
        }
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    log::debug!("Cache hit: {}", key);
                    Some(value)
                }
                Err(e) => {
                    log::warn!("Discarding undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => {
                log::debug!("Cache miss: {}", key);
                None
            }
            Err(e) => {
                log::warn!("Cache read failed for {}, falling back to store: {}", key, e);
                None
            }
        }
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Could not serialize value for {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set(key, &raw, ttl) {
            log::warn!("Cache write failed for {}: {}", key, e);
        }
    }

    pub fn invalidate(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        if let Err(e) = self.store.delete(keys) {
            log::warn!(
                "Cache invalidation failed for {:?}, stale data may be served until TTL expiry: {}",
                keys,
                e
            );
        }
    }

    pub fn invalidate_matching(&self, pattern: &str) {
        match self.store.delete_matching(pattern) {
            Ok(n) => log::debug!("Invalidated {} cache entries matching {}", n, pattern),
            Err(e) => log::warn!(
                "Cache invalidation failed for pattern {}, stale data may be served until TTL expiry: {}",
                pattern,
                e
            ),
        }
    }
}
