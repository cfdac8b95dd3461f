use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One postal code's summed payment amount for a fiscal year, as returned upstream.
/// `postal_code` has not been validated yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    pub postal_code: String,
    pub total_amount: Decimal,
}

impl AggregateRow {
    pub fn new(postal_code: impl Into<String>, total_amount: Decimal) -> Self {
        Self {
            postal_code: postal_code.into(),
            total_amount,
        }
    }
}

/// Rows that passed postal code validation, at most K of them, ascending by amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedSelection(Vec<AggregateRow>);

impl RankedSelection {
    pub(crate) fn new(rows: Vec<AggregateRow>) -> Self {
        Self(rows)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AggregateRow> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[AggregateRow] {
        &self.0
    }

    pub fn postal_codes(&self) -> Vec<&str> {
        self.0.iter().map(|row| row.postal_code.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a RankedSelection {
    type Item = &'a AggregateRow;
    type IntoIter = std::slice::Iter<'a, AggregateRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One geocoder match, WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateCandidate {
    pub latitude: f64,
    pub longitude: f64,
}

/// A selected postal code that resolved to exactly one coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEntry {
    pub postal_code: String,
    pub total_amount: Decimal,
    pub latitude: f64,
    pub longitude: f64,
}

/// The pipeline's terminal artifact, served verbatim as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrichedResult(Vec<EnrichedEntry>);

impl EnrichedResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[EnrichedEntry] {
        &self.0
    }
}

impl From<Vec<EnrichedEntry>> for EnrichedResult {
    fn from(entries: Vec<EnrichedEntry>) -> Self {
        Self(entries)
    }
}
