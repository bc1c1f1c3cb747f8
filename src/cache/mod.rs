//! In-process snapshot caches for resolved principals and their case ABAC

use crate::config::AbacConfig;
use crate::domain::{CaseAbac, PolicyMutation, User, UserId};
use crate::telemetry::metrics::{CACHE_INVALIDATIONS_TOTAL, CACHE_REQUESTS_TOTAL};
use lru::LruCache;
use metrics::counter;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Cache names, used as metric labels
mod names {
    pub const USERS: &str = "users";
    pub const CASE_ABAC: &str = "case_abac";
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

struct CacheState<K: Hash + Eq, V> {
    entries: LruCache<K, CacheEntry<V>>,
    /// Bumped by every `invalidate_all`
    generation: u64,
}

/// Bounded LRU cache whose entries expire a fixed time after insertion.
///
/// The lock is never held while a value is being computed. A computation
/// that started before an `invalidate_all` does not store its result.
pub struct TtlLruCache<K: Hash + Eq, V> {
    name: &'static str,
    ttl: Duration,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> TtlLruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(name: &'static str, capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            name,
            ttl,
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                generation: 0,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Unexpired value for the key; expired entries are dropped on access
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock().await;
        Self::lookup(&mut state, key, self.ttl)
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut state = self.state.lock().await;
        state.entries.put(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Cached value, or the result of `compute` which is then cached.
    ///
    /// Errors are returned as-is and never cached.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let generation = {
            let mut state = self.state.lock().await;
            if let Some(value) = Self::lookup(&mut state, &key, self.ttl) {
                counter!(CACHE_REQUESTS_TOTAL, "cache" => self.name, "result" => "hit")
                    .increment(1);
                return Ok(value);
            }
            state.generation
        };
        counter!(CACHE_REQUESTS_TOTAL, "cache" => self.name, "result" => "miss").increment(1);

        let value = compute().await?;

        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.entries.put(
                key,
                CacheEntry {
                    value: value.clone(),
                    inserted_at: Instant::now(),
                },
            );
        } else {
            tracing::debug!(cache = self.name, "Discarding value computed before invalidation");
        }
        Ok(value)
    }

    pub async fn invalidate_all(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.generation = state.generation.wrapping_add(1);
    }

    /// Number of stored entries, expired ones not yet evicted included
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn lookup(state: &mut CacheState<K, V>, key: &K, ttl: Duration) -> Option<V> {
        let expired = match state.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < ttl => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            state.entries.pop(key);
        }
        None
    }
}

/// The two process-wide caches behind case ABAC resolution, both keyed by
/// user id.
pub struct AbacCacheManager {
    users: TtlLruCache<UserId, User>,
    case_abacs: TtlLruCache<UserId, Arc<CaseAbac>>,
}

impl AbacCacheManager {
    pub fn new(config: &AbacConfig) -> Self {
        Self {
            users: TtlLruCache::new(names::USERS, config.cache_capacity, config.cache_ttl()),
            case_abacs: TtlLruCache::new(
                names::CASE_ABAC,
                config.cache_capacity,
                config.cache_ttl(),
            ),
        }
    }

    pub fn users(&self) -> &TtlLruCache<UserId, User> {
        &self.users
    }

    pub fn case_abacs(&self) -> &TtlLruCache<UserId, Arc<CaseAbac>> {
        &self.case_abacs
    }

    /// Discard every cached principal and snapshot after a policy mutation
    pub async fn handle_mutation(&self, mutation: PolicyMutation) {
        self.users.invalidate_all().await;
        self.case_abacs.invalidate_all().await;
        counter!(CACHE_INVALIDATIONS_TOTAL, "reason" => mutation.as_str()).increment(1);
        tracing::info!(reason = mutation.as_str(), "Case ABAC caches cleared");
    }
}
