//! Lookup cache in front of the store
//!
//! Name resolution walks up to five SQL tiers and pair-set lookups fan out
//! into one query per pair, so repeated questions about the same drugs are
//! answered from memory. Entries expire after a TTL and the cache holds at
//! most `capacity` entries; when full, expired entries are purged first and
//! then the oldest insert is evicted.

use crate::config::CacheConfig;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Minimal cache interface used by the knowledge facade
pub trait LookupCache<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn insert(&self, key: K, value: V);
    fn clear(&self);
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    inserted: u64,
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    next_seq: u64,
    hits: u64,
    misses: u64,
}

/// In-process cache with per-entry expiry and a size bound
pub struct TtlCache<K, V> {
    ttl: Duration,
    capacity: usize,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_seq: 0,
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.capacity)
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn make_room(&self, state: &mut CacheState<K, V>, now: Instant) {
        if state.entries.len() < self.capacity {
            return;
        }
        state.entries.retain(|_, entry| entry.expires_at > now);
        while state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    state.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl<K, V> LookupCache<K, V> for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock();
        let now = Instant::now();

        let fresh = match state.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                state.entries.remove(key);
                None
            }
            None => None,
        };

        if fresh.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        fresh
    }

    fn insert(&self, key: K, value: V) {
        let mut state = self.state.lock();
        let now = Instant::now();
        if !state.entries.contains_key(&key) {
            self.make_room(&mut state, now);
        }
        let inserted = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
                inserted,
            },
        );
    }

    fn clear(&self) {
        self.state.lock().entries.clear();
    }
}

/// Cache key for a single drug name
pub fn drug_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Cache key for a list of drug names
///
/// Case, whitespace and repeats are normalised away but order is kept: the
/// matrix prefers the `i -> j` direction, so `[a, b]` and `[b, a]` may
/// legitimately return different edges.
pub fn pair_key<S: AsRef<str>>(names: &[S]) -> String {
    let mut keys: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let key = drug_key(name.as_ref());
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys.join("|")
}
