//! Bounded TTL cache with stale-while-revalidate and single-flight.
//!
//! Fresh entries are served without an upstream call. Expired entries are
//! served immediately while exactly one background refresh runs. Misses block
//! the first caller; concurrent callers for the same key join that caller's
//! in-flight computation instead of issuing duplicates.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;

/// Result broadcast to callers waiting on an in-flight computation.
/// The error is carried as a rendered message so it stays cloneable.
type FlightResult<V> = Option<Result<V, String>>;

/// Errors surfaced by [`SwrCache::get_or_compute`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The upstream computation failed and no cached value was available.
    #[error("upstream unavailable: {0}")]
    Upstream(String),
}

impl CacheError {
    /// A UI-appropriate message for this error.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            CacheError::Upstream(_) => "Weather data is currently unavailable.",
        }
    }
}

struct Entry<V> {
    value: V,
    computed_at: Instant,
    last_access: Instant,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    in_flight: HashMap<K, watch::Receiver<FlightResult<V>>>,
}

/// A shared, bounded stale-while-revalidate cache.
///
/// Cloning is cheap and shares the underlying store. Construct once at
/// process start and inject it; don't reach for module-level state.
pub struct SwrCache<K, V> {
    inner: Arc<Mutex<Inner<K, V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> Clone for SwrCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ttl: self.ttl,
            capacity: self.capacity,
        }
    }
}

impl<K, V> SwrCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            })),
            ttl,
            capacity,
        }
    }

    /// Look up `key`, computing the value through `compute` when needed.
    ///
    /// A fresh entry returns immediately. A stale entry also returns
    /// immediately and triggers at most one background refresh; a refresh
    /// failure keeps the stale entry and is only logged. On a miss the first
    /// caller computes while concurrent callers await the same result.
    ///
    /// A caller that stops waiting does not cancel the computation; it still
    /// completes and populates the cache for subsequent callers.
    ///
    /// # Errors
    /// Returns [`CacheError::Upstream`] when the computation fails and no
    /// cached value exists for the key.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let mut rx = {
            let mut guard = self.inner.lock();
            let now = Instant::now();

            let cached = match guard.entries.get_mut(&key) {
                Some(entry) => {
                    entry.last_access = now;
                    Some((entry.value.clone(), now.duration_since(entry.computed_at)))
                }
                None => None,
            };

            if let Some((value, age)) = cached {
                if age < self.ttl {
                    tracing::debug!(?key, "cache hit");
                    return Ok(value);
                }
                // Stale: serve immediately, refresh at most once in the background.
                if !guard.in_flight.contains_key(&key) {
                    let (tx, rx) = watch::channel(None);
                    guard.in_flight.insert(key.clone(), rx);
                    drop(guard);
                    tracing::debug!(?key, "serving stale value, refreshing in background");
                    self.spawn_flight(key, tx, compute());
                } else {
                    tracing::debug!(?key, "serving stale value, refresh already in flight");
                }
                return Ok(value);
            }

            if let Some(rx) = guard.in_flight.get(&key) {
                tracing::debug!(?key, "cache miss, joining in-flight computation");
                let rx = rx.clone();
                drop(guard);
                rx
            } else {
                tracing::debug!(?key, "cache miss, computing");
                let (tx, rx) = watch::channel(None);
                guard.in_flight.insert(key.clone(), rx.clone());
                drop(guard);
                self.spawn_flight(key, tx, compute());
                rx
            }
        };

        loop {
            let outcome = rx.borrow_and_update().clone();
            if let Some(outcome) = outcome {
                return outcome.map_err(CacheError::Upstream);
            }
            rx.changed()
                .await
                .map_err(|_| CacheError::Upstream("computation abandoned".to_string()))?;
        }
    }

    /// Drop any cached entry for `key`. In-flight computations still complete.
    pub fn invalidate(&self, key: &K) {
        self.inner.lock().entries.remove(key);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the computation to completion off the caller's task, publish the
    /// result to waiters, and update the store. The entry is replaced
    /// wholesale; readers never observe a partial update.
    fn spawn_flight<Fut>(&self, key: K, tx: watch::Sender<FlightResult<V>>, fut: Fut)
    where
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let ttl = self.ttl;
        let capacity = self.capacity;

        tokio::spawn(async move {
            let outcome = fut.await;
            let shared = {
                let mut guard = inner.lock();
                guard.in_flight.remove(&key);
                match outcome {
                    Ok(value) => {
                        let now = Instant::now();
                        guard.entries.insert(
                            key.clone(),
                            Entry {
                                value: value.clone(),
                                computed_at: now,
                                last_access: now,
                            },
                        );
                        evict(&mut guard.entries, ttl, capacity, now);
                        Ok(value)
                    }
                    Err(err) => {
                        let message = format!("{err:#}");
                        tracing::warn!(?key, error = %message, "computation failed; stale entry (if any) retained");
                        Err(message)
                    }
                }
            };
            let _ = tx.send(Some(shared));
        });
    }
}

/// Drop entries unseen for `2 x ttl`, then trim the least recently accessed
/// entries until the store fits `capacity`.
fn evict<K, V>(entries: &mut HashMap<K, Entry<V>>, ttl: Duration, capacity: usize, now: Instant)
where
    K: Eq + Hash + Clone,
{
    entries.retain(|_, entry| now.duration_since(entry.last_access) < ttl * 2);

    while entries.len() > capacity {
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());
        match oldest {
            Some(key) => {
                entries.remove(&key);
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_compute(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl Future<Output = anyhow::Result<u32>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(value)
        }
    }

    #[tokio::test]
    async fn test_miss_computes_and_caches() {
        let cache: SwrCache<&str, u32> = SwrCache::new(Duration::from_secs(60), 16);
        let calls = Arc::new(AtomicUsize::new(0));

        let v = cache
            .get_or_compute("k", || counting_compute(&calls, 7))
            .await
            .unwrap();
        assert_eq!(v, 7);

        // Second call is a fresh hit; no recompute.
        let v = cache
            .get_or_compute("k", || counting_compute(&calls, 8))
            .await
            .unwrap();
        assert_eq!(v, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_compute_once() {
        let cache: SwrCache<&str, u32> = SwrCache::new(Duration::from_secs(60), 16);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("k", || counting_compute(&calls, 42))
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_value_served_without_blocking_on_refresh() {
        let cache: SwrCache<&str, u32> = SwrCache::new(Duration::from_secs(60), 16);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("k", || counting_compute(&calls, 1))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;

        // Refresh future never resolves; the stale value must come back anyway.
        let v = cache
            .get_or_compute("k", || async {
                std::future::pending::<()>().await;
                Ok(0)
            })
            .await
            .unwrap();
        assert_eq!(v, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_refresh_replaces_stale_entry() {
        let cache: SwrCache<&str, u32> = SwrCache::new(Duration::from_secs(60), 16);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("k", || counting_compute(&calls, 1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        let stale = cache
            .get_or_compute("k", || counting_compute(&calls, 2))
            .await
            .unwrap();
        assert_eq!(stale, 1);

        // Let the spawned refresh finish, then expect the new value.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fresh = cache
            .get_or_compute("k", || counting_compute(&calls, 3))
            .await
            .unwrap();
        assert_eq!(fresh, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_keeps_stale_value() {
        let cache: SwrCache<&str, u32> = SwrCache::new(Duration::from_secs(60), 16);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("k", || counting_compute(&calls, 5))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        let v = cache
            .get_or_compute("k", || async { anyhow::bail!("upstream down") })
            .await
            .unwrap();
        assert_eq!(v, 5);

        // After the failed refresh the stale entry is still served.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let v = cache
            .get_or_compute("k", || async { anyhow::bail!("upstream down") })
            .await
            .unwrap();
        assert_eq!(v, 5);
    }

    #[tokio::test]
    async fn test_failure_with_no_cached_value_propagates() {
        let cache: SwrCache<&str, u32> = SwrCache::new(Duration::from_secs(60), 16);

        let err = cache
            .get_or_compute("k", || async { anyhow::bail!("upstream down") })
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Upstream(_)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let cache: SwrCache<&str, u32> = SwrCache::new(Duration::from_secs(60), 16);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("k", || counting_compute(&calls, 1))
            .await
            .unwrap();
        cache.invalidate(&"k");

        let v = cache
            .get_or_compute("k", || counting_compute(&calls, 2))
            .await
            .unwrap();
        assert_eq!(v, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_joiners_observe_the_leaders_failure() {
        let cache: SwrCache<&str, u32> = SwrCache::new(Duration::from_secs(60), 16);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("k", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        anyhow::bail!("upstream down")
                    })
                    .await
            }));
        }

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, CacheError::Upstream(_)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_entries_pruned_after_double_ttl() {
        let cache: SwrCache<&str, u32> = SwrCache::new(Duration::from_secs(60), 16);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("idle", || counting_compute(&calls, 1))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(121)).await;

        // The next insert sweeps entries unseen for 2 x ttl.
        cache
            .get_or_compute("fresh", || counting_compute(&calls, 2))
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let cache: SwrCache<u32, u32> = SwrCache::new(Duration::from_secs(60), 2);
        let calls = Arc::new(AtomicUsize::new(0));

        for key in 0..5 {
            cache
                .get_or_compute(key, || counting_compute(&calls, key))
                .await
                .unwrap();
        }
        assert!(cache.len() <= 2);
    }
}
