//! Runtime configuration.
//!
//! A [`PipelineConfig`] is loaded from an optional JSON file; every section
//! and field has a default, so `{}` is a valid config. Environment variables
//! are applied on top of the file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TORONTO_RENT_GEOCODER_URL` | `geocoder.base_url` |
//! | `TORONTO_RENT_GEOCODER_TIMEOUT` | `geocoder.timeout_secs` |

use crate::error::FeatureError;
use crate::geocoding::photon::DEFAULT_PHOTON_URL;
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const ENV_GEOCODER_URL: &str = "TORONTO_RENT_GEOCODER_URL";
pub const ENV_GEOCODER_TIMEOUT: &str = "TORONTO_RENT_GEOCODER_TIMEOUT";

/// Geocoding client settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Pause after every request.
    pub request_pause_ms: u64,
    /// Pause after a timeout or an unavailable service.
    pub backoff_pause_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PHOTON_URL.to_string(),
            user_agent: "toronto-rent-features".to_string(),
            timeout_secs: 10,
            request_pause_ms: 300,
            backoff_pause_ms: 2000,
        }
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_pause(&self) -> Duration {
        Duration::from_millis(self.request_pause_ms)
    }

    pub fn backoff_pause(&self) -> Duration {
        Duration::from_millis(self.backoff_pause_ms)
    }
}

/// Train/test split settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows held out, in `(0, 1)`.
    pub test_size: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub schema: FeatureSchema,
    pub geocoder: GeocoderConfig,
    pub split: SplitConfig,
}

impl PipelineConfig {
    /// Read a JSON config file. Missing sections take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, FeatureError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, FeatureError> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, FeatureError> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), FeatureError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), FeatureError> {
        if let Some(url) = lookup(ENV_GEOCODER_URL) {
            self.geocoder.base_url = url;
        }
        if let Some(timeout) = lookup(ENV_GEOCODER_TIMEOUT) {
            self.geocoder.timeout_secs = timeout.trim().parse().map_err(|e| {
                FeatureError::InvalidParameter(format!("Invalid {}: {}", ENV_GEOCODER_TIMEOUT, e))
            })?;
        }
        Ok(())
    }

    /// Check the schema and split settings.
    pub fn validate(&self) -> Result<(), FeatureError> {
        self.schema.validate()?;
        if !(self.split.test_size > 0.0 && self.split.test_size < 1.0) {
            return Err(FeatureError::InvalidParameter(format!(
                "test_size must be in (0, 1), got {}",
                self.split.test_size
            )));
        }
        Ok(())
    }

    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_geocoder(mut self, geocoder: GeocoderConfig) -> Self {
        self.geocoder = geocoder;
        self
    }

    pub fn with_split(mut self, test_size: f64, seed: u64) -> Self {
        self.split = SplitConfig { test_size, seed };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_json_is_default() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.geocoder.timeout(), Duration::from_secs(10));
        assert_eq!(config.split.seed, 42);
    }

    #[test]
    fn test_partial_sections() {
        let config =
            PipelineConfig::from_json_str(r#"{"geocoder": {"request_pause_ms": 0}, "split": {"seed": 7}}"#)
                .unwrap();
        assert_eq!(config.geocoder.request_pause(), Duration::ZERO);
        assert_eq!(config.geocoder.backoff_pause(), Duration::from_secs(2));
        assert_eq!(config.split.seed, 7);
        assert_eq!(config.split.test_size, 0.2);
    }

    #[test]
    fn test_invalid_test_size() {
        let result = PipelineConfig::from_json_str(r#"{"split": {"test_size": 1.5}}"#);
        assert!(matches!(result, Err(FeatureError::InvalidParameter(_))));
    }

    #[test]
    fn test_overrides() {
        let mut config = PipelineConfig::default();
        config
            .apply_overrides(|key| match key {
                ENV_GEOCODER_URL => Some("http://localhost:2322".to_string()),
                ENV_GEOCODER_TIMEOUT => Some("3".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.geocoder.base_url, "http://localhost:2322");
        assert_eq!(config.geocoder.timeout_secs, 3);
    }

    #[test]
    fn test_override_bad_timeout() {
        let mut config = PipelineConfig::default();
        let result = config.apply_overrides(|key| {
            (key == ENV_GEOCODER_TIMEOUT).then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_file_with_schema_override() {
        let mut schema = FeatureSchema::toronto();
        schema.landmarks.truncate(2);
        let config = PipelineConfig::default().with_schema(schema);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&config).unwrap()).unwrap();

        let loaded = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded.schema.landmarks.len(), 2);
        assert_eq!(loaded.schema.feature_names().len(), 25);
    }
}
