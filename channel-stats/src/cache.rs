//! Bounded, expiring, single-flight cache of completed pipeline runs.
//!
//! A key is either *ready* (a stored value with an expiry) or *in flight*
//! (one caller is computing it and others wait on a [`watch`] channel). Both
//! tables sit behind one [`std::sync::Mutex`] that is never held across an
//! `.await`.
//!
//! Only successful results are stored. When the computing caller is dropped
//! before finishing, its in-flight slot is released and a waiting caller
//! takes over the computation, so an abandoned run never leaves an entry.

use crate::error::Error;
use crate::model::{AggregationResult, Credential};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Identifies one aggregation: the channel name as asked for, and the key used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub channel_name: String,
    pub credential: Credential,
}

impl CacheKey {
    pub fn new(channel_name: impl Into<String>, credential: Credential) -> Self {
        Self {
            channel_name: channel_name.into(),
            credential,
        }
    }
}

/// The cache the pipeline uses.
pub type AggregationCache = SingleFlightCache<CacheKey, AggregationResult, Error>;

/// What waiters see: `None` until the computation finishes.
type Outcome<V, E> = Option<Result<V, E>>;

struct Entry<V> {
    value: V,
    expires_at: Instant,
    /// Logical clock value of the last insert or hit, for LRU eviction.
    last_used: u64,
}

struct Inner<K, V, E> {
    ready: HashMap<K, Entry<V>>,
    in_flight: HashMap<K, watch::Receiver<Outcome<V, E>>>,
    clock: u64,
}

impl<K: Eq + Hash + Clone, V, E> Inner<K, V, E> {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn purge_expired(&mut self, now: Instant) {
        self.ready.retain(|_, entry| entry.expires_at > now);
    }

    fn insert(&mut self, key: K, value: V, now: Instant, ttl: Duration, capacity: usize) {
        self.purge_expired(now);
        if !self.ready.contains_key(&key) {
            while self.ready.len() >= capacity {
                let Some(lru) = self
                    .ready
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(key, _)| key.clone())
                else {
                    break;
                };
                self.ready.remove(&lru);
                tracing::debug!("evicted least recently used cache entry");
            }
        }
        let last_used = self.tick();
        self.ready.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
                last_used,
            },
        );
    }
}

enum Role<V, E> {
    Hit(V),
    Wait(watch::Receiver<Outcome<V, E>>),
    Compute(watch::Sender<Outcome<V, E>>),
}

/// A cache that runs at most one computation per key at a time.
///
/// Entries expire `ttl` after they were stored, and at most `capacity` ready
/// entries are kept; storing one more evicts the least recently used.
/// Cloning is cheap and clones share state.
pub struct SingleFlightCache<K, V, E> {
    inner: Arc<Mutex<Inner<K, V, E>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V, E> Clone for SingleFlightCache<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ttl: self.ttl,
            capacity: self.capacity,
        }
    }
}

impl<K, V, E> fmt::Debug for SingleFlightCache<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlightCache")
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<K, V, E> SingleFlightCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    /// `capacity` is raised to at least one.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                ready: HashMap::new(),
                in_flight: HashMap::new(),
                clock: 0,
            })),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V, E>> {
        // nothing panics while the lock is held, so a poisoned lock is still consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value for `key`, or computes it.
    ///
    /// If another caller is already computing `key`, this waits for it and
    /// returns a clone of its value or error instead of computing again.
    /// `compute` is called at most once, and only by the caller that ends up
    /// doing the work.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        loop {
            match self.claim(&key) {
                Role::Hit(value) => {
                    tracing::trace!("cache hit");
                    return Ok(value);
                }
                Role::Wait(mut rx) => {
                    tracing::trace!("waiting for in-flight computation");
                    let outcome = rx.wait_for(Option::is_some).await.map(|state| (*state).clone());
                    match outcome {
                        Ok(Some(result)) => return result,
                        // the computing caller went away; try to take over
                        Ok(None) | Err(_) => continue,
                    }
                }
                Role::Compute(tx) => {
                    let guard = InFlightGuard {
                        cache: self,
                        key: &key,
                        armed: true,
                    };
                    let result = compute().await;
                    guard.complete(&result);
                    // nobody may be listening, which is fine
                    let _ = tx.send(Some(result.clone()));
                    return result;
                }
            }
        }
    }

    /// Looks `key` up and decides what this caller does next.
    fn claim(&self, key: &K) -> Role<V, E> {
        let mut inner = self.lock();
        let now = Instant::now();
        inner.purge_expired(now);

        let clock = inner.tick();
        if let Some(entry) = inner.ready.get_mut(key) {
            entry.last_used = clock;
            return Role::Hit(entry.value.clone());
        }
        if let Some(rx) = inner.in_flight.get(key) {
            return Role::Wait(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        inner.in_flight.insert(key.clone(), rx);
        Role::Compute(tx)
    }

    /// Returns the stored value for `key` if present and fresh, without computing.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        inner.purge_expired(Instant::now());
        let clock = inner.tick();
        let entry = inner.ready.get_mut(key)?;
        entry.last_used = clock;
        Some(entry.value.clone())
    }

    /// Drops the stored value for `key`; an in-flight computation is unaffected.
    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().ready.remove(key).is_some()
    }

    /// Drops every stored value.
    pub fn clear(&self) {
        self.lock().ready.clear();
    }

    /// Number of fresh stored values.
    pub fn len(&self) -> usize {
        let mut inner = self.lock();
        inner.purge_expired(Instant::now());
        inner.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys currently being computed.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }
}

/// Releases an in-flight slot, storing the value if the computation succeeded.
///
/// If dropped while still armed (the computing future was cancelled), the
/// slot is released with nothing stored, and dropping the paired sender wakes
/// every waiter.
struct InFlightGuard<'a, K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    cache: &'a SingleFlightCache<K, V, E>,
    key: &'a K,
    armed: bool,
}

impl<K, V, E> InFlightGuard<'_, K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn complete(mut self, result: &Result<V, E>) {
        self.armed = false;
        let mut inner = self.cache.lock();
        inner.in_flight.remove(self.key);
        if let Ok(value) = result {
            inner.insert(
                self.key.clone(),
                value.clone(),
                Instant::now(),
                self.cache.ttl,
                self.cache.capacity,
            );
        }
    }
}

impl<K, V, E> Drop for InFlightGuard<'_, K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("in-flight computation abandoned");
            self.cache.lock().in_flight.remove(self.key);
        }
    }
}
