//! Redis-backed cache shared by every instance of the service.
//!
//! Entries live under `<prefix>:<namespace>:<key>` as JSON text, so they can
//! be read with any redis client. Namespace eviction walks the keyspace
//! with `SCAN` rather than `KEYS`. One connection is kept open and reused;
//! it is dropped and reopened after a transport failure.

use std::{sync::Mutex, time::Duration};

use redis::{Client, Connection, RedisResult};
use tracing::{debug, info, warn};

use crate::{ParamError, RedisConfig, Result};

use super::{CacheBackend, Namespace};

const SCAN_BATCH: usize = 100;

pub struct RedisCache {
    client: Client,
    conn: Mutex<Option<Connection>>,
    prefix: String,
    timeout: Duration,
}

impl RedisCache {
    /// Opens a client and checks the server answers `PING`.
    pub fn new(config: &RedisConfig) -> Result<Self> {
        info!("initializing redis cache at {}", config.url);
        let cache = Self::with_client(Client::open(config.url.as_str())?, &config.key_prefix, Duration::from_secs(config.connect_timeout_secs));

        let pong: String = cache.with_connection(|conn| redis::cmd("PING").query(conn))?;
        if pong != "PONG" {
            return Err(ParamError::StoreUnavailable(format!("redis ping returned {}", pong)));
        }

        Ok(cache)
    }

    fn with_client(
        client: Client,
        prefix: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            conn: Mutex::new(None),
            prefix: prefix.to_string(),
            timeout,
        }
    }

    fn full_key(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> String {
        format!("{}:{}:{}", self.prefix, namespace.as_ref(), key)
    }

    fn namespace_pattern(
        &self,
        namespace: Namespace,
    ) -> String {
        format!("{}:{}:*", self.prefix, namespace.as_ref())
    }

    fn connect(&self) -> Result<Connection> {
        self.client.get_connection_with_timeout(self.timeout).map_err(|e| {
            warn!("redis connection failed: {}", e);
            ParamError::from(e)
        })
    }

    /// Runs `f` on the shared connection, opening it first if needed.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> RedisResult<T>,
    ) -> Result<T> {
        let mut slot = self.conn.lock().map_err(|e| ParamError::Cache(e.to_string()))?;
        if slot.is_none() {
            *slot = Some(self.connect()?);
        }
        let Some(conn) = slot.as_mut() else {
            return Err(ParamError::Cache("redis connection unavailable".to_string()));
        };

        let result = f(conn);
        result.map_err(|e| {
            if e.is_io_error() || e.is_connection_dropped() || e.is_unrecoverable_error() {
                warn!("dropping redis connection: {}", e);
                *slot = None;
            }
            ParamError::from(e)
        })
    }
}

impl CacheBackend for RedisCache {
    fn get_or_insert_with(
        &self,
        namespace: Namespace,
        key: &str,
        init: &mut dyn FnMut() -> Result<String>,
    ) -> Result<String> {
        let full_key = self.full_key(namespace, key);

        let cached: Option<String> = self.with_connection(|conn| redis::cmd("GET").arg(&full_key).query(conn))?;
        if let Some(value) = cached {
            debug!("cache hit {}", full_key);
            return Ok(value);
        }

        let value = init()?;
        self.with_connection(|conn| redis::cmd("SET").arg(&full_key).arg(&value).query::<()>(conn))?;
        Ok(value)
    }

    fn evict(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Result<()> {
        let full_key = self.full_key(namespace, key);
        self.with_connection(|conn| redis::cmd("DEL").arg(&full_key).query::<()>(conn))
    }

    fn evict_all(
        &self,
        namespace: Namespace,
    ) -> Result<()> {
        let pattern = self.namespace_pattern(namespace);

        let deleted = self.with_connection(|conn| {
            let mut keys: Vec<String> = Vec::new();
            let mut cursor: u64 = 0;
            loop {
                let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN").arg(cursor).arg("MATCH").arg(&pattern).arg("COUNT").arg(SCAN_BATCH).query(conn)?;
                keys.extend(batch);
                if next == 0 {
                    break;
                }
                cursor = next;
            }

            if !keys.is_empty() {
                redis::cmd("DEL").arg(&keys).query::<()>(conn)?;
            }
            Ok(keys.len())
        })?;
        debug!("redis evicted {} keys matching {}", deleted, pattern);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;

    fn cache() -> RedisCache {
        RedisCache::with_client(Client::open("redis://127.0.0.1:6379").unwrap(), "parametrization", Duration::from_secs(1))
    }

    #[test]
    fn test_full_key_layout() {
        let cache = cache();
        assert_eq!(cache.full_key(Namespace::Record, &CacheKey::Id(3).to_string()), "parametrization:parametrization:id:3");
        assert_eq!(cache.full_key(Namespace::Record, &CacheKey::Key("DARK_MODE".to_string()).to_string()), "parametrization:parametrization:key:DARK_MODE");
        assert_eq!(cache.full_key(Namespace::Collection, &CacheKey::All.to_string()), "parametrization:allParametrizations:all");
    }

    #[test]
    fn test_connection_is_opened_lazily() {
        let cache = cache();
        assert!(cache.conn.lock().unwrap().is_none());
    }

    #[test]
    fn test_unreachable_server_leaves_no_connection() {
        let cache = RedisCache::with_client(Client::open("redis://127.0.0.1:1").unwrap(), "parametrization", Duration::from_millis(200));

        let err = cache.evict(Namespace::Record, "id:1").unwrap_err();
        assert!(matches!(err, ParamError::StoreUnavailable(_) | ParamError::Cache(_)));
        assert!(cache.conn.lock().unwrap().is_none());
    }

    #[test]
    fn test_namespace_pattern_matches_only_its_namespace() {
        let cache = cache();
        assert_eq!(cache.namespace_pattern(Namespace::Record), "parametrization:parametrization:*");
        assert_eq!(cache.namespace_pattern(Namespace::Collection), "parametrization:allParametrizations:*");
    }
}
