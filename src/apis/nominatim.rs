use crate::app::ports::{GeocoderPort, HttpClientPort, HttpGetRequest};
use crate::constants::{GEOCODER_COUNTRY, GEOCODER_ENDPOINT, GEOCODER_FORMAT, GEOCODER_USER_AGENT};
use crate::error::GeocodeError;
use crate::types::CoordinateCandidate;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Nominatim returns coordinates as decimal strings; plain numbers are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Number(f64),
    Text(String),
}

impl Degrees {
    fn to_f64(&self, field: &str) -> Result<f64, GeocodeError> {
        let value = match self {
            Degrees::Number(n) => *n,
            Degrees::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| GeocodeError::Parse(format!("{field} {s:?}: {e}")))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(GeocodeError::Parse(format!("{field} is not finite")))
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Degrees,
    lon: Degrees,
}

impl NominatimPlace {
    fn to_candidate(&self) -> Result<CoordinateCandidate, GeocodeError> {
        Ok(CoordinateCandidate {
            latitude: self.lat.to_f64("lat")?,
            longitude: self.lon.to_f64("lon")?,
        })
    }
}

/// Resolves U.S. postal codes through Nominatim's structured search.
///
/// This client does not pace itself; callers run lookups through a
/// [`Pacer`](crate::pipeline::pacer::Pacer) to honor the one request per second limit.
pub struct GeocodeClient {
    http: Arc<dyn HttpClientPort>,
    endpoint: String,
    user_agent: String,
}

impl GeocodeClient {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            http,
            endpoint: GEOCODER_ENDPOINT.to_string(),
            user_agent: GEOCODER_USER_AGENT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build_request(&self, postal_code: &str) -> HttpGetRequest {
        HttpGetRequest::new(&self.endpoint)
            .query("format", GEOCODER_FORMAT)
            .query("postalcode", postal_code)
            .query("country", GEOCODER_COUNTRY)
            .header("User-Agent", &self.user_agent)
    }
}

pub fn parse_candidates(body: &[u8]) -> Result<Vec<CoordinateCandidate>, GeocodeError> {
    let places: Vec<NominatimPlace> =
        serde_json::from_slice(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;
    places.iter().map(NominatimPlace::to_candidate).collect()
}

#[async_trait]
impl GeocoderPort for GeocodeClient {
    #[instrument(skip(self))]
    async fn resolve(&self, postal_code: &str) -> Result<Vec<CoordinateCandidate>, GeocodeError> {
        let request = self.build_request(postal_code);
        let response = self
            .http
            .get(&request)
            .await
            .map_err(GeocodeError::Transport)?;
        if !response.is_success() {
            return Err(GeocodeError::Status(response.status));
        }
        let candidates = parse_candidates(&response.bytes)?;
        debug!("Geocoder returned {} candidate(s)", candidates.len());
        Ok(candidates)
    }
}
