use crate::app::ports::{AggregateSourcePort, HttpClientPort, HttpGetRequest};
use crate::constants::{
    PAYMENTS_AMOUNT_FIELD, PAYMENTS_ENDPOINT, PAYMENTS_FISCAL_YEAR_FIELD,
    PAYMENTS_POSTAL_CODE_FIELD, PAYMENTS_TOTAL_FIELD,
};
use crate::error::{PipelineError, Result};
use crate::types::AggregateRow;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Row shape returned by the grouped SoQL query. Socrata omits null columns.
#[derive(Debug, Deserialize)]
struct PaymentAggregateRecord {
    #[serde(default)]
    vendor_zip: Option<String>,
    #[serde(default)]
    total_amount: Option<Decimal>,
}

impl From<PaymentAggregateRecord> for AggregateRow {
    fn from(record: PaymentAggregateRecord) -> Self {
        AggregateRow {
            postal_code: record.vendor_zip.unwrap_or_default(),
            total_amount: record.total_amount.unwrap_or_default(),
        }
    }
}

/// Queries the state payments dataset for per-postal-code totals of one fiscal year.
pub struct PaymentAggregateClient {
    http: Arc<dyn HttpClientPort>,
    endpoint: String,
}

impl PaymentAggregateClient {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self::with_endpoint(http, PAYMENTS_ENDPOINT)
    }

    pub fn with_endpoint(http: Arc<dyn HttpClientPort>, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// SUM per postal code, filtered to the fiscal year, ordered by total ascending.
    pub fn build_request(&self, fiscal_year: i32) -> HttpGetRequest {
        HttpGetRequest::new(&self.endpoint)
            .query(
                "$select",
                format!(
                    "{PAYMENTS_POSTAL_CODE_FIELD}, SUM({PAYMENTS_AMOUNT_FIELD}) AS {PAYMENTS_TOTAL_FIELD}"
                ),
            )
            .query("$where", format!("{PAYMENTS_FISCAL_YEAR_FIELD}={fiscal_year}"))
            .query("$group", PAYMENTS_POSTAL_CODE_FIELD)
            .query("$order", PAYMENTS_TOTAL_FIELD)
    }

    fn fetch_error(&self, reason: impl Into<String>) -> PipelineError {
        PipelineError::Fetch {
            source_url: self.endpoint.clone(),
            reason: reason.into(),
        }
    }
}

pub fn validate_fiscal_year(fiscal_year: i32) -> Result<()> {
    if (1000..=9999).contains(&fiscal_year) {
        Ok(())
    } else {
        Err(PipelineError::InvalidFiscalYear(fiscal_year))
    }
}

#[async_trait]
impl AggregateSourcePort for PaymentAggregateClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_aggregates(&self, fiscal_year: i32) -> Result<Vec<AggregateRow>> {
        validate_fiscal_year(fiscal_year)?;

        let request = self.build_request(fiscal_year);
        debug!(query = ?request.query, "Querying payments dataset");

        let response = self
            .http
            .get(&request)
            .await
            .map_err(|e| self.fetch_error(e))?;
        if !response.is_success() {
            return Err(self.fetch_error(format!("status {}", response.status)));
        }

        let records: Vec<PaymentAggregateRecord> = serde_json::from_slice(&response.bytes)
            .map_err(|e| self.fetch_error(format!("malformed payload: {e}")))?;
        let rows: Vec<AggregateRow> = records.into_iter().map(AggregateRow::from).collect();

        info!("Fetched {} aggregate rows for fiscal year {}", rows.len(), fiscal_year);
        Ok(rows)
    }
}
