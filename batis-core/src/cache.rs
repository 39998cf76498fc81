//! Parsed metadata caching.
//!
//! Raw statements resolve the same way every time for the same text and
//! parameters, so their [`Metadata`] can be reused. The cache is unbounded
//! and never evicts; the manager only consults it when enabled in
//! configuration.
//!
//! ```rust
//! use std::sync::Arc;
//! use batis_core::cache::MetadataCache;
//! use batis_core::flatten::flatten;
//! use batis_core::metadata::Metadata;
//! use batis_core::value::Value;
//!
//! let cache = MetadataCache::new();
//! let params = flatten(&[Value::from(1)]);
//! let key = MetadataCache::key("SELECT #{0}", &params);
//!
//! cache.put(key.clone(), Arc::new(Metadata::new("SELECT ?".into(), vec![], vec![Value::from(1)])));
//! assert_eq!(cache.find(&key).unwrap().prepared_sql, "SELECT ?");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use tracing::trace;

use crate::flatten::ParamMap;
use crate::metadata::Metadata;

/// Cache key: the statement text followed by every parameter key and value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataCacheKey(String);

impl MetadataCacheKey {
    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Statistics about cache usage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
}

impl CacheStats {
    /// Calculate the hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<MetadataCacheKey, Arc<Metadata>>,
    stats: CacheStats,
}

/// A thread-safe metadata cache.
#[derive(Debug, Default)]
pub struct MetadataCache {
    inner: Mutex<Inner>,
}

static GLOBAL_METADATA_CACHE: LazyLock<MetadataCache> = LazyLock::new(MetadataCache::new);

impl MetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static MetadataCache {
        &GLOBAL_METADATA_CACHE
    }

    /// Build the key for `sql` and its flattened parameters: the text, then
    /// each parameter key in descending order followed by its value.
    ///
    /// Keys are plain concatenations, so two different inputs that render to
    /// the same text share an entry.
    pub fn key(sql: &str, params: &ParamMap) -> MetadataCacheKey {
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort_by(|a, b| b.cmp(a));

        let mut buf = String::from(sql);
        for k in keys {
            buf.push_str(k);
            buf.push_str(&params[k.as_str()].to_string());
        }
        MetadataCacheKey(buf)
    }

    /// Like [`key`](Self::key), prefixed with `scope`. The manager scopes
    /// entries by driver and style generation, since cached metadata holds
    /// driver tokens.
    pub fn scoped_key(scope: &str, sql: &str, params: &ParamMap) -> MetadataCacheKey {
        let MetadataCacheKey(text) = Self::key(sql, params);
        let mut buf = String::with_capacity(scope.len() + 1 + text.len());
        buf.push_str(scope);
        buf.push('\0');
        buf.push_str(&text);
        MetadataCacheKey(buf)
    }

    /// Look up cached metadata.
    pub fn find(&self, key: &MetadataCacheKey) -> Option<Arc<Metadata>> {
        let mut inner = self.inner.lock();
        let found = inner.entries.get(key).cloned();
        if found.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        found
    }

    /// Store metadata, replacing any previous entry.
    pub fn put(&self, key: MetadataCacheKey, metadata: Arc<Metadata>) {
        trace!(sql = %metadata.prepared_sql, "caching metadata");
        self.inner.lock().entries.insert(key, metadata);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Drop every entry and reset the statistics.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stats = CacheStats::default();
    }

    /// Hit and miss counts so far.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_sorts_descending() {
        let mut params = ParamMap::new();
        params.insert("a".into(), Value::Int(1));
        params.insert("c".into(), Value::from("x"));
        params.insert("b".into(), Value::Null);

        let key = MetadataCache::key("SELECT 1", &params);
        assert_eq!(key.as_str(), "SELECT 1cxbNULLa1");
    }

    #[test]
    fn test_key_ignores_insertion_order() {
        let a = flatten(&[Value::from(1), Value::from(2)]);
        let mut b = ParamMap::new();
        b.insert("1".into(), Value::from(2));
        b.insert("0".into(), Value::from(1));
        assert_eq!(MetadataCache::key("q", &a), MetadataCache::key("q", &b));
    }

    #[test]
    fn test_scoped_key_separates_drivers() {
        let params = flatten(&[Value::from(1)]);
        let mysql = MetadataCache::scoped_key("mysql#0", "SELECT #{0}", &params);
        let postgres = MetadataCache::scoped_key("postgres#0", "SELECT #{0}", &params);
        let bumped = MetadataCache::scoped_key("mysql#1", "SELECT #{0}", &params);

        assert_ne!(mysql, postgres);
        assert_ne!(mysql, bumped);
        assert_eq!(mysql.as_str(), "mysql#0\0SELECT #{0}01");
    }

    #[test]
    fn test_find_put_and_stats() {
        let cache = MetadataCache::new();
        let key = MetadataCache::key("SELECT #{0}", &flatten(&[Value::from(1)]));

        assert!(cache.find(&key).is_none());
        cache.put(key.clone(), Arc::new(Metadata::new("SELECT ?".into(), vec![], vec![])));
        assert!(cache.find(&key).is_some());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(cache.stats().hit_rate(), 0.5);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
