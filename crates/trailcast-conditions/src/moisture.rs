//! Moisture budget: a decaying running total approximating ground wetness
//! from recent precipitation.

use trailcast_weather::{DailyObservation, WeatherSeries};

use crate::InferenceError;

/// Default drying rate: roughly 20% of accumulated moisture is lost per day.
pub const DEFAULT_DECAY_FACTOR: f64 = 0.8;

/// Default immediate contribution of snowfall. Snow mostly sits on the
/// surface until it melts, so it counts for far less than rain on the day
/// it falls.
pub const DEFAULT_SNOWMELT_FACTOR: f64 = 0.35;

/// Accumulates a decaying wetness signal over a daily series.
#[derive(Debug, Clone, Copy)]
pub struct MoistureModel {
    pub decay_factor: f64,
    pub snowmelt_factor: f64,
}

impl Default for MoistureModel {
    fn default() -> Self {
        Self {
            decay_factor: DEFAULT_DECAY_FACTOR,
            snowmelt_factor: DEFAULT_SNOWMELT_FACTOR,
        }
    }
}

impl MoistureModel {
    #[must_use]
    pub fn new(decay_factor: f64, snowmelt_factor: f64) -> Self {
        Self {
            decay_factor,
            snowmelt_factor,
        }
    }

    /// Rain plus snowmelt-adjusted snow for one day, clamped non-negative.
    fn precip_equivalent(&self, day: &DailyObservation) -> f64 {
        day.precipitation_mm.max(0.0) + day.snowfall_mm.max(0.0) * self.snowmelt_factor
    }

    /// One budget value per day, in series order: yesterday's budget decayed,
    /// plus today's precipitation equivalent. Never negative; decays toward
    /// zero in dry spells.
    ///
    /// # Errors
    /// Returns [`InferenceError::EmptySeries`] for an empty series.
    pub fn compute_budgets(&self, series: &WeatherSeries) -> Result<Vec<f64>, InferenceError> {
        if series.is_empty() {
            return Err(InferenceError::EmptySeries);
        }

        let mut budgets = Vec::with_capacity(series.len());
        let mut budget = 0.0_f64;
        for day in series.days() {
            budget = budget * self.decay_factor + self.precip_equivalent(day);
            budgets.push(budget);
        }
        Ok(budgets)
    }
}
