//! Daily weather-history provider backed by Open-Meteo.
//! Free, no API key required.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::types::{DailyObservation, WeatherError, WeatherSeries};

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "Trailcast/0.1.0 (https://github.com/trailcast)";

const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_sum,snowfall_sum,weathercode";

/// How much history and forecast to request from the provider.
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow {
    pub past_days: u32,
    pub forecast_days: u32,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            past_days: 7,
            forecast_days: 1,
        }
    }
}

/// Fetches daily weather history for a coordinate.
#[derive(Debug, Clone)]
pub struct HistoryProvider {
    client: Client,
    base_url: String,
    window: HistoryWindow,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize, Default)]
struct DailyBlock {
    #[serde(default)]
    time: Vec<NaiveDate>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    snowfall_sum: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<i32>>,
}

impl HistoryProvider {
    /// Create a provider with its own HTTP client.
    ///
    /// # Errors
    /// Returns [`WeatherError::Network`] if the client cannot be built.
    pub fn new(window: HistoryWindow) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: OPEN_METEO_URL.to_string(),
            window,
        })
    }

    /// Point the provider at a different endpoint (tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the daily history window for a coordinate as a gap-free series.
    ///
    /// # Errors
    /// Returns [`WeatherError`] on network failure, a non-success status, or
    /// a response with no usable daily data.
    pub async fn fetch_history(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSeries, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("past_days", self.window.past_days.to_string()),
                ("forecast_days", self.window.forecast_days.to_string()),
                ("timezone", "UTC".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status()));
        }

        let body: ForecastResponse = response.json().await?;
        let daily = body
            .daily
            .ok_or_else(|| WeatherError::Parse("response missing daily block".to_string()))?;

        if daily.time.is_empty() {
            return Err(WeatherError::Parse("daily block has no days".to_string()));
        }

        let value = |field: &[Option<f64>], i: usize| field.get(i).copied().flatten();

        let mut days = Vec::with_capacity(daily.time.len());
        let mut prev_max = 0.0_f64;
        let mut prev_min = 0.0_f64;
        for (i, &date) in daily.time.iter().enumerate() {
            // Null precipitation reads as dry; null temperatures carry the
            // previous day's values so freeze signals aren't erased.
            let temp_max_c = value(&daily.temperature_2m_max, i).unwrap_or(prev_max);
            let temp_min_c = value(&daily.temperature_2m_min, i).unwrap_or(prev_min);
            prev_max = temp_max_c;
            prev_min = temp_min_c;

            days.push(DailyObservation {
                date,
                precipitation_mm: value(&daily.precipitation_sum, i).unwrap_or(0.0),
                temp_max_c,
                temp_min_c,
                weather_code: daily.weathercode.get(i).copied().flatten().unwrap_or(0),
                // Open-Meteo reports snowfall_sum in centimeters
                snowfall_mm: value(&daily.snowfall_sum, i).unwrap_or(0.0) * 10.0,
            });
        }

        tracing::debug!(latitude, longitude, days = days.len(), "fetched weather history");
        Ok(WeatherSeries::from_days(days))
    }
}
