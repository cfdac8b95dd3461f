#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zip_spend_map::app::ports::{AggregateSourcePort, ClockPort, GeocoderPort};
use zip_spend_map::error::{GeocodeError, PipelineError, Result};
use zip_spend_map::types::{AggregateRow, CoordinateCandidate};

/// Virtual clock: `sleep` advances time instantly.
#[derive(Default)]
pub struct FakeClock {
    now: Mutex<Duration>,
}

impl FakeClock {
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

#[async_trait]
impl ClockPort for FakeClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

pub struct StubSource {
    rows: Option<Vec<AggregateRow>>,
    hang: bool,
    pub calls: Mutex<usize>,
}

impl StubSource {
    pub fn rows(rows: Vec<AggregateRow>) -> Self {
        Self {
            rows: Some(rows),
            hang: false,
            calls: Mutex::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            rows: None,
            hang: false,
            calls: Mutex::new(0),
        }
    }

    /// A fetch that never completes.
    pub fn hanging() -> Self {
        Self {
            rows: None,
            hang: true,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl AggregateSourcePort for StubSource {
    async fn fetch_aggregates(&self, _fiscal_year: i32) -> Result<Vec<AggregateRow>> {
        *self.calls.lock().unwrap() += 1;
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.rows.clone().ok_or_else(|| PipelineError::Fetch {
            source_url: "stub://payments".to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

/// Canned geocoder that records when each lookup starts on the shared clock.
pub struct StubGeocoder {
    clock: Arc<FakeClock>,
    latency: Duration,
    responses: HashMap<String, std::result::Result<Vec<CoordinateCandidate>, GeocodeError>>,
    hang_on: Option<String>,
    pub calls: Mutex<Vec<(String, Duration)>>,
}

impl StubGeocoder {
    pub fn new(clock: Arc<FakeClock>) -> Self {
        Self {
            clock,
            latency: Duration::from_millis(250),
            responses: HashMap::new(),
            hang_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn respond(mut self, postal_code: &str, candidates: Vec<CoordinateCandidate>) -> Self {
        self.responses.insert(postal_code.to_string(), Ok(candidates));
        self
    }

    pub fn fail(mut self, postal_code: &str, error: GeocodeError) -> Self {
        self.responses.insert(postal_code.to_string(), Err(error));
        self
    }

    /// The lookup for `postal_code` never completes.
    pub fn hang(mut self, postal_code: &str) -> Self {
        self.hang_on = Some(postal_code.to_string());
        self
    }

    pub fn call_starts(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GeocoderPort for StubGeocoder {
    async fn resolve(
        &self,
        postal_code: &str,
    ) -> std::result::Result<Vec<CoordinateCandidate>, GeocodeError> {
        self.calls
            .lock()
            .unwrap()
            .push((postal_code.to_string(), self.clock.now()));
        if self.hang_on.as_deref() == Some(postal_code) {
            std::future::pending::<()>().await;
        }
        self.clock.advance(self.latency);
        self.responses
            .get(postal_code)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn candidate(latitude: f64, longitude: f64) -> CoordinateCandidate {
    CoordinateCandidate {
        latitude,
        longitude,
    }
}

pub fn row(postal_code: &str, amount: i64) -> AggregateRow {
    AggregateRow::new(postal_code, Decimal::from(amount))
}
