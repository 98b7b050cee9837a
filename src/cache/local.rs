//! In-process cache backend.
//!
//! Uses moka's concurrent cache implementation, one cache per namespace.

use std::collections::HashMap;

use moka::sync::Cache;
use strum::IntoEnumIterator;
use tracing::{debug, info};

use crate::{ParamError, Result};

use super::{CacheBackend, Namespace};

/// Thread-safe in-memory cache confined to one process.
///
/// Population goes through moka's `try_get_with`, so concurrent misses on
/// one key run the loader once and a failed loader stores nothing.
/// `capacity` bounds memory only; no time-based expiry is configured.
#[derive(Clone)]
pub struct MemCache {
    namespaces: HashMap<Namespace, Cache<String, String>>,
}

impl MemCache {
    /// Allocate a new [`MemCache`] holding up to `capacity` entries per namespace.
    pub fn new(capacity: u64) -> Self {
        info!("initializing local cache, capacity {} per namespace", capacity);
        Self {
            namespaces: Namespace::iter().map(|ns| (ns, Cache::new(capacity))).collect(),
        }
    }

    fn namespace(
        &self,
        namespace: Namespace,
    ) -> Result<&Cache<String, String>> {
        self.namespaces.get(&namespace).ok_or_else(|| ParamError::Cache(format!("unknown cache namespace {}", namespace.as_ref())))
    }
}

impl CacheBackend for MemCache {
    fn get_or_insert_with(
        &self,
        namespace: Namespace,
        key: &str,
        init: &mut dyn FnMut() -> Result<String>,
    ) -> Result<String> {
        let cache = self.namespace(namespace)?;
        if let Some(value) = cache.get(key) {
            debug!("cache hit {}::{}", namespace.as_ref(), key);
            return Ok(value);
        }
        cache.try_get_with(key.to_string(), || init()).map_err(|e| (*e).clone())
    }

    fn evict(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Result<()> {
        self.namespace(namespace)?.invalidate(key);
        Ok(())
    }

    fn evict_all(
        &self,
        namespace: Namespace,
    ) -> Result<()> {
        self.namespace(namespace)?.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc, Barrier,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use super::*;

    #[test]
    fn test_concurrent_misses_load_once() {
        let cache = Arc::new(MemCache::new(16));
        let loads = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let loads = loads.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_insert_with(Namespace::Collection, "all", &mut || -> Result<String> {
                            loads.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(50));
                            Ok("[]".to_string())
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "[]");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let cache = MemCache::new(16);
        cache.get_or_insert_with(Namespace::Record, "id:1", &mut || -> Result<String> { Ok("one".to_string()) }).unwrap();

        let other = cache.get_or_insert_with(Namespace::Collection, "id:1", &mut || -> Result<String> { Ok("other".to_string()) }).unwrap();
        assert_eq!(other, "other");
    }
}
