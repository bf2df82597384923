//! Bounded, time-expiring cache for idempotent detail lookups.
//!
//! Eviction is by first insertion: refreshing an existing key updates its value
//! and expiry but keeps its place in line.
//!
//! ```rust
//! use std::time::Duration;
//! use knows::DetailCache;
//!
//! let cache = DetailCache::new(2, Duration::from_secs(60));
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.set("a", 10);
//! cache.set("c", 3);
//!
//! assert_eq!(cache.get("a"), None);
//! assert_eq!(cache.get("b"), Some(2));
//! assert_eq!(cache.get("c"), Some(3));
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL is too large to represent as an instant.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: VecDeque<String>,
}

impl<V> CacheState<V> {
    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|existing| existing != key);
        }
    }

    fn purge_expired(&mut self, now: Instant) {
        self.entries.retain(|_, entry| entry.is_live(now));
        let entries = &self.entries;
        self.order.retain(|key| entries.contains_key(key));
    }
}

#[derive(Debug)]
pub struct DetailCache<V> {
    state: Mutex<CacheState<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> DetailCache<V> {
    /// A capacity of zero disables caching entirely.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::with_capacity(capacity.min(1024)),
                order: VecDeque::with_capacity(capacity.min(1024)),
            }),
            capacity,
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Entries currently held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<V> {
        if self.capacity == 0 {
            return None;
        }

        let mut state = self.state();
        match state.entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }

        state.remove(key);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        if self.capacity == 0 {
            return;
        }

        let key = key.into();
        let now = Instant::now();
        let expires_at = now.checked_add(self.ttl);
        let mut state = self.state();

        if let Some(entry) = state.entries.get_mut(&key) {
            entry.value = value;
            entry.expires_at = expires_at;
            return;
        }

        if state.entries.len() >= self.capacity {
            state.purge_expired(now);
        }
        while state.entries.len() >= self.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                }
                None => break,
            }
        }

        state.order.push_back(key.clone());
        state.entries.insert(key, CacheEntry { value, expires_at });
    }

    // Every critical section leaves the map and order consistent, so a
    // poisoned lock still guards valid state.
    fn state(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
