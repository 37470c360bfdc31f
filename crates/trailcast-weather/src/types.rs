use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    #[must_use]
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    /// Get a human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Freezing rain and freezing drizzle glaze trails even when the daily
    /// minimum stays above zero.
    #[must_use]
    pub fn is_freezing_precip(&self) -> bool {
        matches!(self, Self::Sleet)
    }
}

/// One calendar day of provider observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub precipitation_mm: f64,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
    pub weather_code: i32,
    pub snowfall_mm: f64,
}

impl DailyObservation {
    /// The WMO condition category for this day.
    #[must_use]
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }
}

/// An ordered, gap-free run of daily observations for one location.
///
/// Provider gaps are filled with zero-precipitation placeholders rather than
/// dropped, so the lookback window keeps a constant length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSeries {
    days: Vec<DailyObservation>,
}

impl WeatherSeries {
    /// Build a series from raw provider days.
    ///
    /// Days are sorted ascending by date; duplicate dates keep the first
    /// occurrence. Missing interior dates become placeholders with zero
    /// precipitation and the previous day's temperatures.
    #[must_use]
    pub fn from_days(mut days: Vec<DailyObservation>) -> Self {
        days.sort_by_key(|d| d.date);

        let mut filled: Vec<DailyObservation> = Vec::with_capacity(days.len());
        for day in days {
            if let Some(&prev) = filled.last() {
                if day.date <= prev.date {
                    continue;
                }
                let mut next = prev.date + Duration::days(1);
                while next < day.date {
                    filled.push(DailyObservation {
                        date: next,
                        precipitation_mm: 0.0,
                        temp_max_c: prev.temp_max_c,
                        temp_min_c: prev.temp_min_c,
                        weather_code: 0,
                        snowfall_mm: 0.0,
                    });
                    next += Duration::days(1);
                }
            }
            filled.push(day);
        }

        Self { days: filled }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// All days in ascending date order.
    #[must_use]
    pub fn days(&self) -> &[DailyObservation] {
        &self.days
    }

    /// The most recent day, if any.
    #[must_use]
    pub fn last(&self) -> Option<&DailyObservation> {
        self.days.last()
    }

    /// The trailing `n` days (fewer if the series is shorter).
    #[must_use]
    pub fn recent(&self, n: usize) -> &[DailyObservation] {
        &self.days[self.days.len().saturating_sub(n)..]
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    /// A UI-appropriate message for this error.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::Network(_) => "Unable to reach the weather service.",
            WeatherError::Status(_) => "The weather service is experiencing issues.",
            WeatherError::Parse(_) => "Received an unexpected weather response.",
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn day(date: &str, precip: f64) -> DailyObservation {
        DailyObservation {
            date: date.parse().unwrap(),
            precipitation_mm: precip,
            temp_max_c: 12.0,
            temp_min_c: 4.0,
            weather_code: 61,
            snowfall_mm: 0.0,
        }
    }

    #[test]
    fn test_wmo_code_categories() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(3), WeatherCondition::Cloudy);
        assert_eq!(WeatherCondition::from_wmo_code(63), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(75), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(66), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_wmo_code(99), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_wmo_code_unknown_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_freezing_precip_flags_sleet_only() {
        assert!(WeatherCondition::Sleet.is_freezing_precip());
        assert!(!WeatherCondition::Snow.is_freezing_precip());
        assert!(!WeatherCondition::Rain.is_freezing_precip());
    }

    #[test]
    fn test_series_sorts_days_ascending() {
        let series = WeatherSeries::from_days(vec![
            day("2026-03-03", 2.0),
            day("2026-03-01", 1.0),
            day("2026-03-02", 0.0),
        ]);
        let dates: Vec<_> = series.days().iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2026-03-01", "2026-03-02", "2026-03-03"]);
    }

    #[test]
    fn test_series_fills_gaps_with_placeholders() {
        let series = WeatherSeries::from_days(vec![day("2026-03-01", 5.0), day("2026-03-04", 3.0)]);
        assert_eq!(series.len(), 4);

        let filler = &series.days()[1];
        assert_eq!(filler.date.to_string(), "2026-03-02");
        assert_eq!(filler.precipitation_mm, 0.0);
        assert_eq!(filler.snowfall_mm, 0.0);
        // Placeholders carry the previous day's temperatures
        assert_eq!(filler.temp_min_c, 4.0);
    }

    #[test]
    fn test_series_drops_duplicate_dates() {
        let series = WeatherSeries::from_days(vec![
            day("2026-03-01", 5.0),
            day("2026-03-01", 9.0),
            day("2026-03-02", 1.0),
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.days()[0].precipitation_mm, 5.0);
    }

    #[test]
    fn test_recent_clamps_to_series_length() {
        let series = WeatherSeries::from_days(vec![day("2026-03-01", 1.0)]);
        assert_eq!(series.recent(2).len(), 1);
        assert!(WeatherSeries::from_days(vec![]).recent(2).is_empty());
    }
}
