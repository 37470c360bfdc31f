//! Typed configuration with TOML persistence and validation.
//!
//! The inference thresholds and cache tuning live here rather than as
//! hardcoded constants so deployments can recalibrate without a rebuild.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    #[must_use]
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Inference tuning
    #[serde(default)]
    pub conditions: ConditionsConfig,

    /// Cache tuning
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// History window requested from the provider, in days
    pub lookback_days: u32,

    /// Forecast horizon appended to the window, in days
    pub forecast_days: u32,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            forecast_days: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionsConfig {
    /// Daily retention of the moisture budget, in (0, 1)
    pub decay_factor: f64,

    /// Immediate precipitation-equivalent weight of snowfall, in (0, 1]
    pub snowmelt_factor: f64,

    /// Moisture budget (mm equivalent) above which the verdict is red
    pub red_budget: f64,

    /// Moisture budget (mm equivalent) above which the verdict is yellow
    pub yellow_budget: f64,

    /// 48h rain (mm) that forces a red verdict
    pub heavy_rain_mm: f64,

    /// 48h rain (mm) that forces at least a yellow verdict
    pub moderate_rain_mm: f64,
}

impl Default for ConditionsConfig {
    fn default() -> Self {
        Self {
            decay_factor: 0.8,
            snowmelt_factor: 0.35,
            red_budget: 25.0,
            yellow_budget: 10.0,
            heavy_rain_mm: 50.0,
            moderate_rain_mm: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry freshness window in seconds
    pub ttl_secs: u64,

    /// Maximum number of cached tiles
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 900,
            capacity: 500,
        }
    }
}

impl Config {
    /// Path of the config file under the user config directory.
    ///
    /// # Errors
    /// Returns [`ConfigError::DirNotFound`] when no config directory exists.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::DirNotFound)?;
        Ok(dir.join("trailcast").join("config.toml"))
    }

    /// Load configuration from file, creating the default if it doesn't exist.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on IO or parse failure.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Write the configuration back to its file.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on IO or serialization failure.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// Load and validate; warnings are logged, errors fail the load.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when validation finds errors.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Check every tuning value for sanity.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        let c = &self.conditions;
        if !(c.decay_factor > 0.0 && c.decay_factor < 1.0) {
            result.add_error("conditions.decay_factor", "must be between 0 and 1 exclusive");
        }
        if !(c.snowmelt_factor > 0.0 && c.snowmelt_factor <= 1.0) {
            result.add_error("conditions.snowmelt_factor", "must be in (0, 1]");
        }
        if c.yellow_budget >= c.red_budget {
            result.add_error("conditions.yellow_budget", "must be below red_budget");
        }
        if c.moderate_rain_mm >= c.heavy_rain_mm {
            result.add_error("conditions.moderate_rain_mm", "must be below heavy_rain_mm");
        }

        if self.cache.ttl_secs == 0 {
            result.add_error("cache.ttl_secs", "must be nonzero");
        }
        if self.cache.capacity == 0 {
            result.add_error("cache.capacity", "must be nonzero");
        }

        if self.weather.lookback_days == 0 {
            result.add_error("weather.lookback_days", "must be at least 1");
        } else if self.weather.lookback_days < 3 {
            result.add_warning(
                "weather.lookback_days",
                "windows under 3 days degrade reason and trend quality",
            );
        }

        result
    }
}
