//! Condition inference: ordered threshold rules over the moisture budget and
//! the last 48 hours of weather.

use serde::{Deserialize, Serialize};
use trailcast_weather::WeatherSeries;

use crate::moisture::MoistureModel;
use crate::InferenceError;

/// Ordinal severity scale. The ordering (green < yellow < red) is part of
/// the contract: raising any day's precipitation never lowers the level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLevel {
    #[default]
    Green,
    Yellow,
    Red,
}

impl ConditionLevel {
    /// The stable wire literal for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionLevel::Green => "green",
            ConditionLevel::Yellow => "yellow",
            ConditionLevel::Red => "red",
        }
    }
}

/// A trail-condition verdict. Pure function of the input series: identical
/// series always produce byte-identical results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub level: ConditionLevel,
    pub reasons: Vec<String>,
    pub prediction: String,
}

/// Rule thresholds, calibrated for a 7-day lookback window.
///
/// Budget thresholds are in millimeters of precipitation equivalent; a
/// saturated Pacific-Northwest trail after a week of steady rain lands
/// around 30-40mm under the default decay.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Moisture budget above which trails are assumed saturated.
    pub red_budget: f64,
    /// Moisture budget above which trails are assumed soft.
    pub yellow_budget: f64,
    /// 48h precipitation that forces a red verdict (mm).
    pub heavy_rain_mm: f64,
    /// 48h precipitation that forces at least a yellow verdict (mm).
    pub moderate_rain_mm: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            red_budget: 25.0,
            yellow_budget: 10.0,
            heavy_rain_mm: 50.0,
            moderate_rain_mm: 15.0,
        }
    }
}

/// How many trailing days count as "recent" for rain and freeze checks.
const RECENT_WINDOW_DAYS: usize = 2;

/// Days between the current budget and the trend baseline: the default 7-day
/// lookback minus the 2-day recent window.
const TREND_BASELINE_DAYS: usize = 5;

/// Budget movement smaller than this is treated as flat (mm equivalent).
const TREND_EPSILON_MM: f64 = 0.5;

pub const PREDICTION_WORSENING: &str = "Conditions worsening";
pub const PREDICTION_IMPROVING: &str = "Conditions improving";
pub const PREDICTION_STABLE: &str = "Conditions stable";

/// Maps a weather series to an [`InferenceResult`]. Stateless and cheap to
/// copy; safe to call from any thread without synchronization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEngine {
    model: MoistureModel,
    thresholds: Thresholds,
}

impl ConditionEngine {
    #[must_use]
    pub fn new(model: MoistureModel, thresholds: Thresholds) -> Self {
        Self { model, thresholds }
    }

    /// Classify the series into a level, reasons, and a trend prediction.
    ///
    /// Rules are evaluated most severe first; every rule that fires
    /// contributes a reason (deduplicated, in evaluation order), and the most
    /// severe fired tier decides the level.
    ///
    /// # Errors
    /// Returns [`InferenceError::EmptySeries`] for an empty series; any other
    /// gap-filled series produces a result.
    pub fn infer(&self, series: &WeatherSeries) -> Result<InferenceResult, InferenceError> {
        let budgets = self.model.compute_budgets(series)?;
        let current = budgets.last().copied().unwrap_or(0.0);

        let recent = series.recent(RECENT_WINDOW_DAYS);
        let recent_precip_mm: f64 = recent.iter().map(|d| d.precipitation_mm.max(0.0)).sum();
        let recent_freeze = recent.iter().any(|d| {
            (d.temp_min_c < 0.0 && d.precipitation_mm > 0.0)
                || d.condition().is_freezing_precip()
        });

        let mut reasons: Vec<String> = Vec::new();

        let mut red = false;
        if current > self.thresholds.red_budget {
            red = true;
            push_unique(
                &mut reasons,
                format!("Ground saturated from recent precipitation ({current:.0}mm moisture budget)"),
            );
        }
        if recent_freeze {
            red = true;
            push_unique(
                &mut reasons,
                "Below-freezing temps with precipitation — icy risk".to_string(),
            );
        }
        if recent_precip_mm > self.thresholds.heavy_rain_mm {
            red = true;
            push_unique(&mut reasons, "Heavy rain in last 48h".to_string());
        }

        let level = if red {
            ConditionLevel::Red
        } else {
            let mut yellow = false;
            if current > self.thresholds.yellow_budget {
                yellow = true;
                push_unique(
                    &mut reasons,
                    format!("Lingering moisture from the past week ({current:.0}mm budget)"),
                );
            }
            if recent_precip_mm > self.thresholds.moderate_rain_mm {
                yellow = true;
                push_unique(&mut reasons, "Moderate rain in last 48h".to_string());
            }
            if yellow {
                ConditionLevel::Yellow
            } else {
                ConditionLevel::Green
            }
        };

        let prediction = trend_prediction(&budgets, current, level).to_string();

        Ok(InferenceResult {
            level,
            reasons,
            prediction,
        })
    }
}

/// Compare the current budget with the one from [`TREND_BASELINE_DAYS`]
/// earlier, clamped to the start of short windows. Series shorter than three
/// days have no meaningful trend.
fn trend_prediction(budgets: &[f64], current: f64, level: ConditionLevel) -> &'static str {
    if budgets.len() < 3 {
        return PREDICTION_STABLE;
    }
    let baseline = budgets.len().saturating_sub(1 + TREND_BASELINE_DAYS);
    let delta = current - budgets[baseline];
    if delta > TREND_EPSILON_MM {
        PREDICTION_WORSENING
    } else if delta < -TREND_EPSILON_MM && level == ConditionLevel::Green {
        PREDICTION_IMPROVING
    } else {
        PREDICTION_STABLE
    }
}

fn push_unique(reasons: &mut Vec<String>, reason: String) {
    if !reasons.contains(&reason) {
        reasons.push(reason);
    }
}
