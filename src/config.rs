use crate::constants::{
    DEFAULT_FISCAL_YEAR, DEFAULT_GEOCODE_INTERVAL_MS, DEFAULT_TIMEOUT_SECONDS, DEFAULT_TOP_N,
    ENV_FISCAL_YEAR, ENV_GEOCODE_INTERVAL_MS, ENV_TOP_N, ENV_USER_AGENT, GEOCODER_ENDPOINT,
    GEOCODER_USER_AGENT, NOMINATIM_REQUEST_INTERVAL_LIMIT, PAYMENTS_ENDPOINT,
};
use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub payments: PaymentsConfig,
    pub geocoder: GeocoderConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaymentsConfig {
    pub endpoint: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub min_interval_ms: u64,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub fiscal_year: i32,
    pub top_n: usize,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            endpoint: PAYMENTS_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: GEOCODER_ENDPOINT.to_string(),
            user_agent: GEOCODER_USER_AGENT.to_string(),
            min_interval_ms: DEFAULT_GEOCODE_INTERVAL_MS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fiscal_year: DEFAULT_FISCAL_YEAR,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl GeocoderConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads `path`. A missing file yields defaults unless `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() && !required {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `ZIP_SPEND_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, ENV_FISCAL_YEAR)? {
            self.pipeline.fiscal_year = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_TOP_N)? {
            self.pipeline.top_n = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_GEOCODE_INTERVAL_MS)? {
            self.geocoder.min_interval_ms = v;
        }
        if let Some(v) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            self.geocoder.user_agent = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        crate::apis::payments::validate_fiscal_year(self.pipeline.fiscal_year)?;
        if self.geocoder.min_interval_ms < NOMINATIM_REQUEST_INTERVAL_LIMIT {
            return Err(PipelineError::Config(format!(
                "geocoder.min_interval_ms must be at least {} (got {})",
                NOMINATIM_REQUEST_INTERVAL_LIMIT, self.geocoder.min_interval_ms
            )));
        }
        if self.geocoder.user_agent.trim().is_empty() {
            return Err(PipelineError::Config("geocoder.user_agent must not be empty".into()));
        }
        if self.payments.timeout_seconds == 0 {
            return Err(PipelineError::Config("payments.timeout_seconds must be positive".into()));
        }
        if self.geocoder.timeout_seconds == 0 {
            return Err(PipelineError::Config("geocoder.timeout_seconds must be positive".into()));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| PipelineError::Config(format!("{key}={raw:?}: {e}"))),
        _ => Ok(None),
    }
}
