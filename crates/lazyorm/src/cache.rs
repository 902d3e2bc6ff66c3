//! Read-through cache of mapped query results.
//!
//! Entries are keyed by record type name, compiled SQL and bound parameters,
//! and hold the mapped records behind an `Arc` so hits are cheap to hand out.
//! Nothing expires on its own and writes do not invalidate; callers clear
//! entries with [`ResultCache::clear`] after mutating a table.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::qb::CompiledStatement;
use crate::value::Value;

/// Identity of a cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    type_name: String,
    sql: String,
    params: Vec<Value>,
}

impl CacheKey {
    pub fn new(type_name: impl Into<String>, sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            sql: sql.into(),
            params,
        }
    }

    pub fn for_statement(type_name: &str, stmt: &CompiledStatement) -> Self {
        Self::new(type_name, stmt.sql.clone(), stmt.params.clone())
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Hit / miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Thread-safe result cache, shareable between [`Database`](crate::Database) handles.
#[derive(Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("len", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up previously stored records.
    pub fn get<T: Send + Sync + 'static>(&self, key: &CacheKey) -> Option<Arc<Vec<T>>> {
        let entry = self.entries().get(key).cloned();
        match entry.and_then(|e| e.downcast::<Vec<T>>().ok()) {
            Some(records) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(target: "lazyorm.cache", record = key.type_name(), "cache hit");
                Some(records)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(target: "lazyorm.cache", record = key.type_name(), "cache miss");
                None
            }
        }
    }

    /// Store records under `key`, replacing any previous entry.
    pub fn put<T: Send + Sync + 'static>(&self, key: CacheKey, records: Vec<T>) -> Arc<Vec<T>> {
        let records = Arc::new(records);
        self.entries().insert(key, records.clone());
        records
    }

    /// Remove entries for one record type (exact name match), or everything.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self, type_name: Option<&str>) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        match type_name {
            Some(name) => entries.retain(|key, _| key.type_name != name),
            None => entries.clear(),
        }
        let removed = before - entries.len();
        tracing::debug!(
            target: "lazyorm.cache",
            record = type_name.unwrap_or("*"),
            removed,
            "cache cleared"
        );
        removed
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(type_name: &str, sql: &str) -> CacheKey {
        CacheKey::new(type_name, sql, vec![Value::Int(1)])
    }

    #[test]
    fn put_then_get_returns_same_arc() {
        let cache = ResultCache::new();
        let stored = cache.put(key("User", "SELECT 1"), vec![1u32, 2, 3]);
        let hit = cache.get::<u32>(&key("User", "SELECT 1")).unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 0 });
    }

    #[test]
    fn params_are_part_of_the_key() {
        let cache = ResultCache::new();
        cache.put(key("User", "SELECT 1"), vec![1u32]);
        let other = CacheKey::new("User", "SELECT 1", vec![Value::Int(2)]);
        assert!(cache.get::<u32>(&other).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn wrong_type_is_a_miss() {
        let cache = ResultCache::new();
        cache.put(key("User", "q"), vec![1u32]);
        assert!(cache.get::<String>(&key("User", "q")).is_none());
    }

    #[test]
    fn clear_by_exact_type_name() {
        let cache = ResultCache::new();
        cache.put(key("User", "a"), vec![1u8]);
        cache.put(key("User", "b"), vec![2u8]);
        cache.put(key("UserProfile", "a"), vec![3u8]);
        cache.put(key("Order", "a"), vec![4u8]);

        assert_eq!(cache.clear(Some("User")), 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.get::<u8>(&key("UserProfile", "a")).is_some());

        assert_eq!(cache.clear(None), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let cache = ResultCache::new();
        cache.put(key("User", "q"), vec![1u8]);
        cache.put(key("User", "q"), vec![2u8]);
        assert_eq!(*cache.get::<u8>(&key("User", "q")).unwrap(), vec![2u8]);
        assert_eq!(cache.len(), 1);
    }
}
