//! Key/value cache consumed by the services.
//!
//! Values are JSON documents. A key may also hold a bucket (a JSON object)
//! whose elements are addressed individually, e.g. per-member counters kept
//! under one shared key. Entries are only ever overwritten or deleted, never
//! merged in place, so concurrent invalidations are harmless: the next read
//! recomputes and repopulates.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Names of the cached aggregates.
pub mod keys {
    /// Total number of threads.
    pub const FORUM_THREADS_COUNT: &str = "forum.threadscount";
    /// Total number of posts.
    pub const FORUM_POSTS_COUNT: &str = "forum.postscount";
    /// Bucket with `guest` and `member` latest-post lists.
    pub const FORUM_LATEST_POSTS: &str = "forum.latestposts";
    /// Bucket of thread counts keyed by member id.
    pub const USER_THREADS_COUNT: &str = "user.threadscount";
    /// Bucket of post counts keyed by member id.
    pub const USER_POSTS_COUNT: &str = "user.postscount";
    /// Bucket of vote windows keyed by member id.
    pub const USER_VOTES: &str = "user.votes";

    pub const LATEST_GUEST: &str = "guest";
    pub const LATEST_MEMBER: &str = "member";
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache lock poisoned")]
    Poisoned,
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Cache store interface.
pub trait Cache {
    fn get(&self, key: &str) -> CacheResult<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> CacheResult<()>;
    fn delete(&self, key: &str) -> CacheResult<()>;
    /// Reads one element of the bucket stored under `key`.
    fn get_element(&self, key: &str, element: &str) -> CacheResult<Option<Value>>;
    /// Writes one element, creating the bucket when missing.
    fn set_element(&self, key: &str, element: &str, value: Value) -> CacheResult<()>;
    /// Removes one element, keeping the rest of the bucket.
    fn delete_element(&self, key: &str, element: &str) -> CacheResult<()>;
    fn flush(&self) -> CacheResult<()>;
}

/// Typed helpers over [`Cache`].
pub trait CacheExt: Cache {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set_as<T: Serialize>(&self, key: &str, value: &T) -> CacheResult<()> {
        self.set(key, serde_json::to_value(value)?)
    }

    fn get_element_as<T: DeserializeOwned>(
        &self,
        key: &str,
        element: &str,
    ) -> CacheResult<Option<T>> {
        match self.get_element(key, element)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set_element_as<T: Serialize>(&self, key: &str, element: &str, value: &T) -> CacheResult<()> {
        self.set_element(key, element, serde_json::to_value(value)?)
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}

/// Keys kept by [`InMemoryCache::new`].
pub const DEFAULT_KEY_CAPACITY: usize = 256;
/// Elements kept per bucket by [`InMemoryCache::new`].
pub const DEFAULT_BUCKET_CAPACITY: usize = 4096;

enum Entry {
    Plain(Value),
    Bucket(LruCache<String, Value>),
}

/// Process-local cache with least-recently-used eviction, both across keys
/// and across the elements of each bucket.
pub struct InMemoryCache {
    entries: Mutex<LruCache<String, Entry>>,
    bucket_capacity: NonZeroUsize,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_KEY_CAPACITY, DEFAULT_BUCKET_CAPACITY)
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero capacities are raised to one.
    pub fn with_capacity(keys: usize, bucket_elements: usize) -> Self {
        let keys = NonZeroUsize::new(keys).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(keys)),
            bucket_capacity: NonZeroUsize::new(bucket_elements).unwrap_or(NonZeroUsize::MIN),
        }
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, LruCache<String, Entry>>> {
        self.entries.lock().map_err(|_| CacheError::Poisoned)
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let mut entries = self.lock()?;
        Ok(entries.get(key).map(|entry| match entry {
            Entry::Plain(value) => value.clone(),
            Entry::Bucket(bucket) => Value::Object(
                bucket
                    .iter()
                    .map(|(element, value)| (element.clone(), value.clone()))
                    .collect::<Map<_, _>>(),
            ),
        }))
    }

    fn set(&self, key: &str, value: Value) -> CacheResult<()> {
        self.lock()?.put(key.to_string(), Entry::Plain(value));
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.lock()?.pop(key);
        Ok(())
    }

    fn get_element(&self, key: &str, element: &str) -> CacheResult<Option<Value>> {
        let mut entries = self.lock()?;
        Ok(match entries.get_mut(key) {
            Some(Entry::Bucket(bucket)) => bucket.get(element).cloned(),
            _ => None,
        })
    }

    fn set_element(&self, key: &str, element: &str, value: Value) -> CacheResult<()> {
        let mut entries = self.lock()?;
        if !matches!(entries.get(key), Some(Entry::Bucket(_))) {
            entries.put(
                key.to_string(),
                Entry::Bucket(LruCache::new(self.bucket_capacity)),
            );
        }
        if let Some(Entry::Bucket(bucket)) = entries.get_mut(key) {
            bucket.put(element.to_string(), value);
        }
        Ok(())
    }

    fn delete_element(&self, key: &str, element: &str) -> CacheResult<()> {
        if let Some(Entry::Bucket(bucket)) = self.lock()?.get_mut(key) {
            bucket.pop(element);
        }
        Ok(())
    }

    fn flush(&self) -> CacheResult<()> {
        self.lock()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stores_and_deletes_plain_keys() {
        let cache = InMemoryCache::new();
        cache.set(keys::FORUM_POSTS_COUNT, json!(12)).unwrap();
        assert_eq!(cache.get_as::<i64>(keys::FORUM_POSTS_COUNT).unwrap(), Some(12));
        cache.delete(keys::FORUM_POSTS_COUNT).unwrap();
        assert_eq!(cache.get(keys::FORUM_POSTS_COUNT).unwrap(), None);
    }

    #[test]
    fn elements_are_independent_inside_a_bucket() {
        let cache = InMemoryCache::new();
        cache.set_element(keys::USER_POSTS_COUNT, "1", json!(3)).unwrap();
        cache.set_element(keys::USER_POSTS_COUNT, "2", json!(5)).unwrap();
        cache.delete_element(keys::USER_POSTS_COUNT, "1").unwrap();

        assert_eq!(cache.get_element(keys::USER_POSTS_COUNT, "1").unwrap(), None);
        assert_eq!(
            cache.get_element_as::<i64>(keys::USER_POSTS_COUNT, "2").unwrap(),
            Some(5)
        );
    }

    #[test]
    fn set_element_replaces_non_bucket_values() {
        let cache = InMemoryCache::new();
        cache.set("mixed", json!("scalar")).unwrap();
        cache.set_element("mixed", "a", json!(1)).unwrap();
        assert_eq!(cache.get("mixed").unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn buckets_evict_least_recently_used_elements() {
        let cache = InMemoryCache::with_capacity(4, 2);
        cache.set_element(keys::USER_VOTES, "1", json!(1)).unwrap();
        cache.set_element(keys::USER_VOTES, "2", json!(2)).unwrap();
        assert!(cache.get_element(keys::USER_VOTES, "1").unwrap().is_some());
        cache.set_element(keys::USER_VOTES, "3", json!(3)).unwrap();

        assert_eq!(cache.get_element(keys::USER_VOTES, "2").unwrap(), None);
        assert_eq!(cache.get(keys::USER_VOTES).unwrap(), Some(json!({"1": 1, "3": 3})));
    }

    #[test]
    fn keys_evict_least_recently_used_entries() {
        let cache = InMemoryCache::with_capacity(2, 2);
        cache.set("a", json!(1)).unwrap();
        cache.set("b", json!(2)).unwrap();
        cache.get("a").unwrap();
        cache.set("c", json!(3)).unwrap();

        assert_eq!(cache.get("b").unwrap(), None);
        assert_eq!(cache.get("a").unwrap(), Some(json!(1)));
        assert_eq!(cache.get("c").unwrap(), Some(json!(3)));
    }

    #[test]
    fn flush_clears_everything() {
        let cache = InMemoryCache::new();
        cache.set("a", json!(1)).unwrap();
        cache.set_element("b", "c", json!(2)).unwrap();
        cache.flush().unwrap();
        assert_eq!(cache.get("a").unwrap(), None);
        assert_eq!(cache.get_element("b", "c").unwrap(), None);
    }
}
