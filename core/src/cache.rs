//! Query result caching scoped to one loaded engine.
//!
//! A `Generation` owns an engine and the cache of answers it produced.
//! Reloading artifacts builds a new generation; an old cache is never
//! carried over or patched.

use crate::engine::{Engine, ResultRecord};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

type CacheKey = (String, usize);

/// Bounded map from `(lowercased query, top_k)` to results, evicting the
/// oldest entry first. Capacity 0 disables it.
pub struct QueryCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<CacheKey, Arc<Vec<ResultRecord>>>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, inner: Mutex::new(CacheInner::default()) }
    }

    pub fn key(query: &str, top_k: usize) -> CacheKey {
        (query.to_lowercase(), top_k)
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<ResultRecord>>> {
        let mut inner = self.inner.lock();
        let found = inner.entries.get(key).cloned();
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    pub fn insert(&self, key: CacheKey, results: Arc<Vec<ResultRecord>>) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.entries.contains_key(&key) {
            return;
        }
        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(key, results);
    }

    pub fn len(&self) -> usize { self.inner.lock().entries.len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// `(hits, misses)` since this cache was created.
    pub fn stats(&self) -> (u64, u64) {
        let inner = self.inner.lock();
        (inner.hits, inner.misses)
    }
}

/// A loaded engine together with the cache of answers it produced.
pub struct Generation {
    pub id: u64,
    engine: Engine,
    cache: QueryCache,
}

impl Generation {
    pub fn new(id: u64, engine: Engine, cache_capacity: usize) -> Self {
        Self { id, engine, cache: QueryCache::new(cache_capacity) }
    }

    pub fn engine(&self) -> &Engine { &self.engine }
    pub fn cache(&self) -> &QueryCache { &self.cache }

    pub fn search(&self, query: &str, top_k: usize) -> Arc<Vec<ResultRecord>> {
        let key = QueryCache::key(query, top_k);
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }
        let results = Arc::new(self.engine.search(query, top_k));
        self.cache.insert(key, Arc::clone(&results));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SchemeDocument;
    use crate::fit::{fit, FitOptions};

    fn engine() -> Engine {
        let docs = ["pension for senior citizens", "scholarship for girl students", "crop insurance"]
            .iter()
            .map(|d| SchemeDocument { details: Some(d.to_string()), ..Default::default() })
            .collect();
        let (model, bundle) = fit(docs, &FitOptions::default()).unwrap();
        Engine::from_parts(model, bundle).unwrap()
    }

    #[test]
    fn repeated_query_is_served_from_cache() {
        let generation = Generation::new(1, engine(), 8);
        let first = generation.search("Scholarship", 2);
        let second = generation.search("scholarship", 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(generation.cache().stats(), (1, 1));
    }

    #[test]
    fn top_k_is_part_of_the_key() {
        let generation = Generation::new(1, engine(), 8);
        let a = generation.search("pension", 1);
        let b = generation.search("pension", 3);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 3);
        assert_eq!(generation.cache().len(), 2);
    }

    #[test]
    fn oldest_entry_is_evicted_first() {
        let generation = Generation::new(1, engine(), 2);
        generation.search("pension", 1);
        generation.search("crop", 1);
        generation.search("scholarship", 1);
        assert_eq!(generation.cache().len(), 2);
        assert!(generation.cache().get(&QueryCache::key("pension", 1)).is_none());
        assert!(generation.cache().get(&QueryCache::key("scholarship", 1)).is_some());
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let generation = Generation::new(1, engine(), 0);
        generation.search("pension", 1);
        assert!(generation.cache().is_empty());
    }
}
