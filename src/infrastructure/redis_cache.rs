use std::time::Duration;

use redis::{Client, Commands, RedisError};

use crate::cache::{CacheError, CacheStore};

pub type RedisPool = r2d2::Pool<Client>;

/// Keys deleted per `DEL` when flushing a pattern.
const DELETE_CHUNK: usize = 500;

/// Builds the pool lazily so the service still boots with Redis down;
/// every cache call then degrades to the database.
pub fn create_redis_pool(
    redis_url: &str,
    max_size: u32,
    connection_timeout: Duration,
) -> Result<RedisPool, CacheError> {
    let client = Client::open(redis_url)
        .map_err(|e| CacheError::Unavailable(format!("invalid Redis URL: {e}")))?;
    Ok(r2d2::Pool::builder()
        .max_size(max_size)
        .connection_timeout(connection_timeout)
        .build_unchecked(client))
}

fn command_error(e: RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
    {
        CacheError::Unavailable(e.to_string())
    } else {
        CacheError::Command(e.to_string())
    }
}

/// Redis expiry is whole seconds; a zero TTL would be rejected.
fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[derive(Clone)]
pub struct RedisCache {
    pool: RedisPool,
}

impl RedisCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<Client>, CacheError> {
        self.pool
            .get()
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }
}

impl CacheStore for RedisCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn()?;
        conn.get::<_, Option<String>>(key).map_err(command_error)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn()?;
        conn.set_ex::<_, _, ()>(key, value, expiry_secs(ttl))
            .map_err(command_error)
    }

    fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn()?;
        conn.del::<_, ()>(keys).map_err(command_error)
    }

    fn delete_matching(&self, pattern: &str) -> Result<usize, CacheError> {
        let mut conn = self.conn()?;
        // SCAN instead of KEYS so a large keyspace does not block the server.
        let keys: Vec<String> = conn
            .scan_match::<_, String>(pattern)
            .map_err(command_error)?
            .collect();
        for chunk in keys.chunks(DELETE_CHUNK) {
            conn.del::<_, ()>(chunk).map_err(command_error)?;
        }
        if !keys.is_empty() {
            log::debug!("Invalidated {} cache keys matching {}", keys.len(), pattern);
        }
        Ok(keys.len())
    }
}
