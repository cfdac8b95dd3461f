use crate::app::ports::{AggregateSourcePort, ClockPort, GeocoderPort};
use crate::error::{GeocodeError, PipelineError, Result};
use crate::pipeline::pacer::Pacer;
use crate::pipeline::top_k::select_top_k;
use crate::postal_code;
use crate::types::{AggregateRow, CoordinateCandidate, EnrichedEntry, EnrichedResult, RankedSelection};
use metrics::counter;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// What a single geocode lookup produced, before policy is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Resolved(CoordinateCandidate),
    NotFound,
    Ambiguous(usize),
    Failed(GeocodeError),
}

impl LookupOutcome {
    pub fn classify(result: std::result::Result<Vec<CoordinateCandidate>, GeocodeError>) -> Self {
        match result {
            Ok(candidates) => match candidates.as_slice() {
                [] => LookupOutcome::NotFound,
                [only] => LookupOutcome::Resolved(*only),
                many => LookupOutcome::Ambiguous(many.len()),
            },
            Err(e) => LookupOutcome::Failed(e),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LookupOutcome::Resolved(_) => "resolved",
            LookupOutcome::NotFound => "not_found",
            LookupOutcome::Ambiguous(_) => "ambiguous",
            LookupOutcome::Failed(_) => "failed",
        }
    }
}

/// Why a selected postal code is missing from the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    NotFound,
    Ambiguous { candidates: usize },
    GeocodeFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub postal_code: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::NotFound => {
                write!(f, "no coordinates found for postal code {}", self.postal_code)
            }
            DiagnosticKind::Ambiguous { candidates } => write!(
                f,
                "ambiguous coordinates for postal code {} ({} candidates)",
                self.postal_code, candidates
            ),
            DiagnosticKind::GeocodeFailed { message } => write!(
                f,
                "geocode lookup failed for postal code {}: {}",
                self.postal_code, message
            ),
        }
    }
}

/// Outcome of a complete run. Dropped entries show up only in `diagnostics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentReport {
    pub fiscal_year: i32,
    pub selected: usize,
    pub result: EnrichedResult,
    pub diagnostics: Vec<Diagnostic>,
}

/// Fetches per-postal-code totals, keeps the top K and geocodes them one at a time.
pub struct EnrichmentPipeline {
    source: Arc<dyn AggregateSourcePort>,
    geocoder: Arc<dyn GeocoderPort>,
    clock: Arc<dyn ClockPort>,
    interval: Duration,
}

impl EnrichmentPipeline {
    pub fn new(
        source: Arc<dyn AggregateSourcePort>,
        geocoder: Arc<dyn GeocoderPort>,
        clock: Arc<dyn ClockPort>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            geocoder,
            clock,
            interval,
        }
    }

    /// Aggregate fetch and top-K selection, without geocoding.
    pub async fn select(&self, fiscal_year: i32, k: usize) -> Result<RankedSelection> {
        let rows = self.source.fetch_aggregates(fiscal_year).await?;
        let total = rows.len();
        let selection = select_top_k(rows, k);
        info!(
            "Selected {} of {} aggregate rows (k = {})",
            selection.len(),
            total,
            k
        );
        Ok(selection)
    }

    /// Runs the whole pipeline. Only a failed aggregate fetch or cancellation fails the
    /// run; per-entry geocode problems are recorded as diagnostics. Cancellation is
    /// observed during the fetch, every pacing wait and every in-flight lookup.
    #[instrument(skip(self, cancel))]
    pub async fn run(
        &self,
        fiscal_year: i32,
        k: usize,
        cancel: &CancellationToken,
    ) -> Result<EnrichmentReport> {
        counter!("zsm_pipeline_runs_total").increment(1);
        let mut pacer = Pacer::new(self.clock.clone(), self.interval);

        let selection = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            selection = self.select(fiscal_year, k) => selection?,
        };
        let (result, diagnostics) = self.enrich(&selection, &mut pacer, cancel).await?;

        info!(
            "Enriched {} of {} selected postal codes ({} dropped)",
            result.len(),
            selection.len(),
            diagnostics.len()
        );
        Ok(EnrichmentReport {
            fiscal_year,
            selected: selection.len(),
            result,
            diagnostics,
        })
    }

    async fn enrich(
        &self,
        selection: &RankedSelection,
        pacer: &mut Pacer,
        cancel: &CancellationToken,
    ) -> Result<(EnrichedResult, Vec<Diagnostic>)> {
        let mut entries = Vec::with_capacity(selection.len());
        let mut diagnostics = Vec::new();

        for row in selection {
            pacer.wait(cancel).await?;
            let code = postal_code::normalize(&row.postal_code);
            let resolved = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                resolved = self.geocoder.resolve(&code) => resolved,
            };
            let outcome = LookupOutcome::classify(resolved);
            pacer.complete();

            counter!("zsm_geocode_lookups_total", "outcome" => outcome.label()).increment(1);
            match apply_policy(row, code, outcome) {
                Ok(entry) => entries.push(entry),
                Err(diagnostic) => {
                    warn!(postal_code = %diagnostic.postal_code, "{}", diagnostic);
                    diagnostics.push(diagnostic);
                }
            }
        }

        Ok((EnrichedResult::from(entries), diagnostics))
    }
}

/// Exactly one candidate is accepted; the pipeline never picks among several.
fn apply_policy(
    row: &AggregateRow,
    postal_code: String,
    outcome: LookupOutcome,
) -> std::result::Result<EnrichedEntry, Diagnostic> {
    let kind = match outcome {
        LookupOutcome::Resolved(candidate) => {
            return Ok(EnrichedEntry {
                postal_code,
                total_amount: row.total_amount,
                latitude: candidate.latitude,
                longitude: candidate.longitude,
            })
        }
        LookupOutcome::NotFound => DiagnosticKind::NotFound,
        LookupOutcome::Ambiguous(candidates) => DiagnosticKind::Ambiguous { candidates },
        LookupOutcome::Failed(e) => DiagnosticKind::GeocodeFailed {
            message: e.to_string(),
        },
    };
    Err(Diagnostic { postal_code, kind })
}
