//! TTL cache.
//!
//! A namespaced, expiring key-value store shared by the Upstream Client and
//! the Stream Resolver. Built on `dashmap` for the same per-key-atomic reason
//! as the Health Tracker: gets/sets never need to take a global lock.

use crate::models::{CacheEntry, now_ms};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Default)]
pub struct TtlCache {
    entries: DashMap<String, CacheEntry<serde_json::Value>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespaces a caller-provided logical key as `"<kind>::<logical-key>"`.
    pub fn namespaced_key(kind: &str, logical_key: &str) -> String {
        format!("{kind}::{logical_key}")
    }

    /// A miss both when absent and when `expires_at < now`; a stale read
    /// evicts the entry.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = now_ms();
        let hit = match self.entries.get(key) {
            Some(entry) if entry.expires_at >= now => Some(entry.value.clone()),
            Some(_) => None,
            None => None,
        };

        if hit.is_none() {
            // Either never present, or present-but-stale: in both cases the
            // caller observes a miss. Evict the stale entry so it doesn't
            // linger.
            self.entries.remove_if(key, |_, entry| entry.expires_at < now);
            return None;
        }

        hit.and_then(|value| serde_json::from_value(value).ok())
    }

    /// Overwrites any existing entry for `key` with `value`, expiring at
    /// `now + ttl_ms`.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl_ms: u64) {
        if let Ok(json) = serde_json::to_value(value) {
            self.entries.insert(
                key.to_string(),
                CacheEntry {
                    expires_at: now_ms() + ttl_ms,
                    value: json,
                },
            );
        }
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn hit_within_ttl_matches_byte_for_byte() {
        let cache = TtlCache::new();
        cache.set("k", &"payload".to_string(), 1_000);
        let value: String = cache.get("k").unwrap();
        assert_eq!(value, "payload");
    }

    #[test]
    fn read_after_ttl_is_a_miss_and_evicts() {
        let cache = TtlCache::new();
        cache.set("k", &42u32, 5);
        sleep(Duration::from_millis(25));
        let value: Option<u32> = cache.get("k");
        assert!(value.is_none());
        assert!(cache.entries.is_empty());
    }

    #[test]
    fn delete_removes_key() {
        let cache = TtlCache::new();
        cache.set("k", &1u32, 10_000);
        cache.delete("k");
        assert!(cache.get::<u32>("k").is_none());
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache = TtlCache::new();
        cache.set("k", &1u32, 10_000);
        cache.set("k", &2u32, 10_000);
        assert_eq!(cache.get::<u32>("k"), Some(2));
    }

    #[test]
    fn namespaced_key_format() {
        assert_eq!(TtlCache::namespaced_key("piped", "abc"), "piped::abc");
    }
}
