use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

use crate::error::Result;
use crate::models::ValuationConfig;

/// Allowed drift of the criterion weight total from 1.0
const WEIGHT_TOTAL_TOLERANCE: f64 = 1e-6;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub valuation: ValuationConfig,
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Where the CLI reads the subject and the market listings from
#[derive(Debug, Clone, Deserialize)]
pub struct InputSettings {
    #[serde(default = "default_subject_path")]
    pub subject_path: String,
    #[serde(default = "default_listings_path")]
    pub listings_path: String,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            subject_path: default_subject_path(),
            listings_path: default_listings_path(),
        }
    }
}

fn default_subject_path() -> String { "data/subject.json".to_string() }
fn default_listings_path() -> String { "data/market_listings_response.json".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// `text` prints the estimate, `json` the full report
    #[serde(default = "default_output_format")]
    pub format: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { format: default_output_format() }
    }
}

fn default_output_format() -> String { "text".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Configuration file (config/default.toml)
    /// 2. Local configuration file (config/local.toml)
    /// 3. Environment variables (prefixed with COMPS__)
    ///
    /// The valuation section has no built-in defaults; it must come from one of these.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // e.g., COMPS__VALUATION__MIN_SALES_COUNT -> valuation.min_sales_count
            .add_source(env_source())
            .build()?;

        Self::from_config(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        Self::from_config(settings)
    }

    fn from_config(config: Config) -> Result<Self> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;

        if !settings.weights_balanced() {
            tracing::warn!(
                "Criterion weights sum to {:.4}, expected 1.0",
                settings.valuation.criteria_weights.total()
            );
        }

        Ok(settings)
    }

    /// Whether the criterion weights sum to 1.0
    pub fn weights_balanced(&self) -> bool {
        (self.valuation.criteria_weights.total() - 1.0).abs() <= WEIGHT_TOTAL_TOLERANCE
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("COMPS")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
