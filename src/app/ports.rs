use async_trait::async_trait;
use std::time::Duration;

use crate::error::{GeocodeError, Result};
use crate::types::{AggregateRow, CoordinateCandidate};

// Outbound HTTP
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, request: &HttpGetRequest) -> std::result::Result<HttpGetResult, String>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HttpGetRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpGetRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// Pipeline-side ports
#[async_trait]
pub trait AggregateSourcePort: Send + Sync {
    async fn fetch_aggregates(&self, fiscal_year: i32) -> Result<Vec<AggregateRow>>;
}

#[async_trait]
pub trait GeocoderPort: Send + Sync {
    /// Zero candidates is a successful lookup; `Err` means the lookup itself failed.
    async fn resolve(
        &self,
        postal_code: &str,
    ) -> std::result::Result<Vec<CoordinateCandidate>, GeocodeError>;
}

/// Monotonic time source used for request pacing.
#[async_trait]
pub trait ClockPort: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
    async fn sleep(&self, duration: Duration);
}
