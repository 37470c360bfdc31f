//! Cached condition lookups: fetch history, infer, memoize per map tile.

use chrono::Utc;
use trailcast_cache::{CacheError, SwrCache, TileKey};
use trailcast_weather::HistoryProvider;

use crate::infer::{ConditionEngine, InferenceResult};

/// Fetch + infer behind a stale-while-revalidate cache.
///
/// Construct once at process start and clone into request handlers; clones
/// share the provider client and the cache.
#[derive(Clone)]
pub struct ConditionService {
    provider: HistoryProvider,
    engine: ConditionEngine,
    cache: SwrCache<TileKey, InferenceResult>,
}

impl ConditionService {
    #[must_use]
    pub fn new(
        provider: HistoryProvider,
        engine: ConditionEngine,
        cache: SwrCache<TileKey, InferenceResult>,
    ) -> Self {
        Self {
            provider,
            engine,
            cache,
        }
    }

    /// The trail-condition verdict for a coordinate.
    ///
    /// Keyed by rounded coordinate bucket and the current UTC date, so nearby
    /// requests on the same day share one provider call. Provider failures
    /// degrade to a stale verdict when one exists.
    ///
    /// # Errors
    /// Returns [`CacheError::Upstream`] when the provider fails and no cached
    /// verdict is available for the tile.
    pub async fn condition_at(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<InferenceResult, CacheError> {
        let key = TileKey::new(latitude, longitude, Utc::now().date_naive());
        tracing::debug!(latitude, longitude, ?key, "condition lookup");
        let provider = self.provider.clone();
        let engine = self.engine;

        self.cache
            .get_or_compute(key, move || async move {
                let series = provider.fetch_history(latitude, longitude).await?;
                let result = engine.infer(&series)?;
                Ok(result)
            })
            .await
    }

    /// Forget the cached verdict for a coordinate (e.g. after a trusted
    /// on-the-ground report contradicts it).
    pub fn invalidate(&self, latitude: f64, longitude: f64) {
        let key = TileKey::new(latitude, longitude, Utc::now().date_naive());
        tracing::debug!(?key, "invalidating cached verdict");
        self.cache.invalidate(&key);
    }
}
