//! TOML-based advisor configuration and preset definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::advisor::CarbonAdvisor;
use crate::appliance::{ApplianceProfile, StaticCatalog};
use crate::forecast::{FEATURE_WIDTH, ForecastBuilder};
use crate::model::{CarbonModel, LinearModel, ModelError, RemoteModel};
use crate::schedule::{BehaviorClass, OptimizerParams, SlotOptimizer};
use crate::weather::{CsvWeather, Location, OpenMeteo, WeatherError, WeatherSource};

/// Top-level advisor configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from
/// TOML with [`AdvisorConfig::from_toml_file`] or use
/// [`AdvisorConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdvisorConfig {
    /// Where to forecast for.
    #[serde(default)]
    pub location: LocationConfig,
    /// Forecast horizon.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Weather source selection.
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Inference backend selection.
    #[serde(default)]
    pub model: ModelConfig,
    /// Slot search thresholds.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Fallback appliance profile.
    #[serde(default)]
    pub appliance: DefaultApplianceConfig,
    /// Known appliances keyed by task name.
    #[serde(default)]
    pub appliances: BTreeMap<String, ApplianceConfig>,
}

/// Coordinate of the household.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationConfig {
    /// Latitude in decimal degrees (-90..=90).
    pub latitude: f64,
    /// Longitude in decimal degrees (-180..=180).
    pub longitude: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: 51.5074,
            longitude: -0.1278,
        }
    }
}

/// Forecast horizon parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Hours to forecast from the current hour (must be > 0).
    pub horizon_hours: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { horizon_hours: 24 }
    }
}

/// Weather source parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    /// Source: `"open_meteo"` or `"csv"`.
    pub source: String,
    /// Open-Meteo base URL.
    pub base_url: String,
    /// CSV file for the `"csv"` source.
    pub csv_path: Option<PathBuf>,
    /// Local-time offset of CSV timestamps from UTC (seconds).
    pub csv_utc_offset_seconds: i32,
    /// HTTP timeout (seconds).
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            source: "open_meteo".to_string(),
            base_url: crate::weather::DEFAULT_BASE_URL.to_string(),
            csv_path: None,
            csv_utc_offset_seconds: 0,
            timeout_secs: 10,
        }
    }
}

/// Inference backend parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Backend: `"linear"` or `"remote"`.
    pub kind: String,
    /// Linear model intercept (gCO2/kWh).
    pub intercept: f32,
    /// Linear model weights in feature order
    /// `[hour, month, day_of_week, temperature, shortwave_radiation, wind_speed]`.
    pub weights: Vec<f32>,
    /// Inference endpoint for the `"remote"` backend.
    pub endpoint: Option<String>,
    /// HTTP timeout (seconds).
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: "linear".to_string(),
            intercept: 260.0,
            weights: vec![0.0, 0.0, 0.0, -1.5, -0.2, -3.0],
            endpoint: None,
            timeout_secs: 10,
        }
    }
}

/// Slot search parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Window mean above which the day is dirty (gCO2/kWh).
    pub green_threshold: f64,
    /// Drop from the current hour that justifies waiting (gCO2/kWh).
    pub wait_delta: f64,
    /// Latest start offset searched (hours).
    pub max_start_offset: usize,
    /// First start hour for attended tasks (inclusive).
    pub attended_start_hour: u32,
    /// Last start hour for attended tasks (inclusive).
    pub attended_end_hour: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let p = OptimizerParams::default();
        Self {
            green_threshold: p.green_threshold,
            wait_delta: p.wait_delta,
            max_start_offset: p.max_start_offset,
            attended_start_hour: p.attended_start_hour,
            attended_end_hour: p.attended_end_hour,
        }
    }
}

impl From<&OptimizerConfig> for OptimizerParams {
    fn from(c: &OptimizerConfig) -> Self {
        Self {
            green_threshold: c.green_threshold,
            wait_delta: c.wait_delta,
            max_start_offset: c.max_start_offset,
            attended_start_hour: c.attended_start_hour,
            attended_end_hour: c.attended_end_hour,
        }
    }
}

/// Profile used when an appliance is unknown.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultApplianceConfig {
    /// Power draw (kW).
    pub default_power_kw: f64,
    /// `"attended"` or `"unattended"`.
    pub default_behavior: String,
}

impl Default for DefaultApplianceConfig {
    fn default() -> Self {
        Self {
            default_power_kw: 1.0,
            default_behavior: "attended".to_string(),
        }
    }
}

/// One known appliance.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplianceConfig {
    /// Power draw (kW).
    pub power_kw: f64,
    /// `"attended"` or `"unattended"`.
    pub behavior: String,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"forecast.horizon_hours"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

fn appliance(power_kw: f64, behavior: &str) -> ApplianceConfig {
    ApplianceConfig {
        power_kw,
        behavior: behavior.to_string(),
    }
}

impl AdvisorConfig {
    /// Returns the baseline configuration: London, Open-Meteo, linear model
    /// and a handful of common household appliances.
    pub fn baseline() -> Self {
        let appliances = [
            ("Laundry", appliance(0.5, "attended")),
            ("Dishwasher", appliance(1.2, "unattended")),
            ("EV Charging", appliance(7.0, "unattended")),
            ("Tumble Dryer", appliance(2.5, "attended")),
            ("Oven", appliance(2.0, "attended")),
        ]
        .into_iter()
        .map(|(name, cfg)| (name.to_string(), cfg))
        .collect();

        Self {
            appliances,
            ..Self::default()
        }
    }

    /// Returns the strict preset: lower green threshold and a smaller
    /// improvement needed before recommending a delay.
    pub fn strict() -> Self {
        Self {
            optimizer: OptimizerConfig {
                green_threshold: 120.0,
                wait_delta: 15.0,
                ..OptimizerConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "strict"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "strict" => Ok(Self::strict()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ConfigError {
                field: field.to_string(),
                message,
            })
        };

        let loc = &self.location;
        if !(-90.0..=90.0).contains(&loc.latitude) {
            push("location.latitude", "must be in [-90, 90]".into());
        }
        if !(-180.0..=180.0).contains(&loc.longitude) {
            push("location.longitude", "must be in [-180, 180]".into());
        }

        if self.forecast.horizon_hours == 0 {
            push("forecast.horizon_hours", "must be > 0".into());
        }

        let w = &self.weather;
        match w.source.as_str() {
            "open_meteo" => {}
            "csv" => {
                if w.csv_path.is_none() {
                    push("weather.csv_path", "required when weather.source = \"csv\"".into());
                }
            }
            other => push(
                "weather.source",
                format!("must be \"open_meteo\" or \"csv\", got \"{other}\""),
            ),
        }

        let m = &self.model;
        match m.kind.as_str() {
            "linear" => {
                if m.weights.len() != FEATURE_WIDTH {
                    push(
                        "model.weights",
                        format!("must have {FEATURE_WIDTH} entries, got {}", m.weights.len()),
                    );
                }
            }
            "remote" => {
                if m.endpoint.is_none() {
                    push("model.endpoint", "required when model.kind = \"remote\"".into());
                }
            }
            other => push(
                "model.kind",
                format!("must be \"linear\" or \"remote\", got \"{other}\""),
            ),
        }

        let o = &self.optimizer;
        if !(o.green_threshold.is_finite() && o.green_threshold >= 0.0) {
            push("optimizer.green_threshold", "must be >= 0".into());
        }
        if !(o.wait_delta.is_finite() && o.wait_delta >= 0.0) {
            push("optimizer.wait_delta", "must be >= 0".into());
        }
        if o.attended_end_hour > 23 {
            push("optimizer.attended_end_hour", "must be <= 23".into());
        }
        if o.attended_start_hour > o.attended_end_hour {
            push(
                "optimizer.attended_start_hour",
                "must be <= optimizer.attended_end_hour".into(),
            );
        }

        let a = &self.appliance;
        if !(a.default_power_kw.is_finite() && a.default_power_kw >= 0.0) {
            push("appliance.default_power_kw", "must be >= 0".into());
        }
        if let Err(e) = a.default_behavior.parse::<BehaviorClass>() {
            push("appliance.default_behavior", e.to_string());
        }

        for (name, cfg) in &self.appliances {
            if !(cfg.power_kw.is_finite() && cfg.power_kw >= 0.0) {
                push(&format!("appliances.{name}.power_kw"), "must be >= 0".into());
            }
            if let Err(e) = cfg.behavior.parse::<BehaviorClass>() {
                push(&format!("appliances.{name}.behavior"), e.to_string());
            }
        }

        errors
    }

    /// Default appliance profile; falls back to 1 kW attended if the
    /// configured behavior does not parse.
    pub fn default_profile(&self) -> ApplianceProfile {
        ApplianceProfile {
            power_kw: self.appliance.default_power_kw,
            behavior: self
                .appliance
                .default_behavior
                .parse()
                .unwrap_or(BehaviorClass::Attended),
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.location.latitude, self.location.longitude)
    }

    /// Appliance catalog from `[appliances]`; entries with an invalid
    /// behavior are skipped (see [`AdvisorConfig::validate`]).
    pub fn catalog(&self) -> StaticCatalog {
        self.appliances
            .iter()
            .filter_map(|(name, cfg)| {
                let behavior = cfg.behavior.parse().ok()?;
                Some((
                    name.as_str(),
                    ApplianceProfile {
                        power_kw: cfg.power_kw,
                        behavior,
                    },
                ))
            })
            .collect()
    }

    /// Builds the configured weather source.
    ///
    /// # Errors
    ///
    /// Returns `WeatherError` if the HTTP client cannot be created or a
    /// CSV source has no path.
    pub fn weather_source(&self) -> Result<Arc<dyn WeatherSource>, WeatherError> {
        let w = &self.weather;
        if w.source == "csv" {
            let path = w
                .csv_path
                .clone()
                .ok_or_else(|| WeatherError::Malformed("weather.csv_path is not set".into()))?;
            return Ok(Arc::new(CsvWeather::new(path, w.csv_utc_offset_seconds)));
        }
        Ok(Arc::new(OpenMeteo::new(
            w.base_url.clone(),
            Duration::from_secs(w.timeout_secs),
        )?))
    }

    /// Builds the configured inference backend.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if the HTTP client cannot be created or the
    /// configuration is incomplete.
    pub fn model(&self) -> Result<Arc<dyn CarbonModel>, ModelError> {
        let m = &self.model;
        if m.kind == "remote" {
            let endpoint = m
                .endpoint
                .clone()
                .ok_or_else(|| ModelError::Malformed("model.endpoint is not set".into()))?;
            return Ok(Arc::new(RemoteModel::new(
                endpoint,
                Duration::from_secs(m.timeout_secs),
            )?));
        }
        let weights: [f32; FEATURE_WIDTH] = m.weights.as_slice().try_into().map_err(|_| {
            ModelError::Malformed(format!(
                "model.weights must have {FEATURE_WIDTH} entries, got {}",
                m.weights.len()
            ))
        })?;
        Ok(Arc::new(LinearModel::new(m.intercept, weights)))
    }

    /// Wires every collaborator into an advisor.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the section whose collaborator failed
    /// to initialize.
    pub fn build_advisor(&self) -> Result<CarbonAdvisor, ConfigError> {
        let weather = self.weather_source().map_err(|e| ConfigError {
            field: "weather".to_string(),
            message: e.to_string(),
        })?;
        let model = self.model().map_err(|e| ConfigError {
            field: "model".to_string(),
            message: e.to_string(),
        })?;
        Ok(CarbonAdvisor::new(
            weather,
            model,
            Arc::new(self.catalog()),
            ForecastBuilder::new(self.forecast.horizon_hours),
            SlotOptimizer::new(OptimizerParams::from(&self.optimizer)),
        )
        .with_default_profile(self.default_profile()))
    }
}
