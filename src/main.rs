use std::time::Duration;

use anyhow::{bail, Context, Result};
use trailcast_cache::SwrCache;
use trailcast_conditions::{ConditionEngine, ConditionService, MoistureModel, Thresholds};
use trailcast_weather::{HistoryProvider, HistoryWindow};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    trailcast_core::init()?;

    let (config, _validation) = trailcast_core::Config::load_validated()?;

    let mut args = std::env::args().skip(1);
    let (latitude, longitude) = match (args.next(), args.next()) {
        (Some(lat), Some(lon)) => (
            lat.parse::<f64>().context("invalid latitude")?,
            lon.parse::<f64>().context("invalid longitude")?,
        ),
        _ => bail!("usage: trailcast <latitude> <longitude>"),
    };

    // Wire the service once; request handlers would share clones of it.
    let provider = HistoryProvider::new(HistoryWindow {
        past_days: config.weather.lookback_days,
        forecast_days: config.weather.forecast_days,
    })?;
    let engine = ConditionEngine::new(
        MoistureModel::new(
            config.conditions.decay_factor,
            config.conditions.snowmelt_factor,
        ),
        Thresholds {
            red_budget: config.conditions.red_budget,
            yellow_budget: config.conditions.yellow_budget,
            heavy_rain_mm: config.conditions.heavy_rain_mm,
            moderate_rain_mm: config.conditions.moderate_rain_mm,
        },
    );
    let cache = SwrCache::new(Duration::from_secs(config.cache.ttl_secs), config.cache.capacity);
    let service = ConditionService::new(provider, engine, cache);

    tracing::info!(latitude, longitude, "looking up trail conditions");

    match service.condition_at(latitude, longitude).await {
        Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
        Err(e) => {
            tracing::error!("condition lookup failed: {e}");
            println!("{}", e.user_message());
        }
    }

    Ok(())
}
