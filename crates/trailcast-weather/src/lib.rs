//! Weather history for Trailcast
//!
//! Provides daily weather history via the Open-Meteo API, normalized into a
//! gap-free [`WeatherSeries`] that the condition engine can consume.

pub mod provider;
pub mod types;

pub use provider::{HistoryProvider, HistoryWindow};
pub use types::{DailyObservation, WeatherCondition, WeatherError, WeatherSeries};
