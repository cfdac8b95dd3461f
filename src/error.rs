use thiserror::Error;

/// Errors that abort a whole pipeline run (or fail startup).
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to fetch aggregates from {source_url}: {reason}")]
    Fetch { source_url: String, reason: String },

    #[error("fiscal year must be a 4-digit year, got {0}")]
    InvalidFiscalYear(i32),

    #[error("pipeline run was cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single geocode lookup. Recovered inside the pipeline loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Transport(String),

    #[error("geocoder responded with status {0}")]
    Status(u16),

    #[error("geocoder response could not be parsed: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
