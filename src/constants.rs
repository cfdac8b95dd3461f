/// Upstream endpoints and fixed request parameters shared across the crate.

// Maryland state payment data (Socrata)
pub const PAYMENTS_ENDPOINT: &str = "https://opendata.maryland.gov/resource/7syw-q4cy.json";
pub const PAYMENTS_POSTAL_CODE_FIELD: &str = "vendor_zip";
pub const PAYMENTS_AMOUNT_FIELD: &str = "amount";
pub const PAYMENTS_TOTAL_FIELD: &str = "total_amount";
pub const PAYMENTS_FISCAL_YEAR_FIELD: &str = "fiscal_year";

// Nominatim search
pub const GEOCODER_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
pub const GEOCODER_COUNTRY: &str = "United States";
pub const GEOCODER_FORMAT: &str = "json";
/// Nominatim usage policy requires an identifying agent on every request.
pub const GEOCODER_USER_AGENT: &str = "Maryland App";

/// Nominatim allows at most one request per second (ms).
pub const NOMINATIM_REQUEST_INTERVAL_LIMIT: u64 = 1000;
pub const NOMINATIM_REQUEST_INTERVAL_MARGIN: u64 = 10;
pub const DEFAULT_GEOCODE_INTERVAL_MS: u64 =
    NOMINATIM_REQUEST_INTERVAL_LIMIT + NOMINATIM_REQUEST_INTERVAL_MARGIN;

pub const DEFAULT_FISCAL_YEAR: i32 = 2015;
pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

pub const POSTAL_CODE_LENGTH: usize = 5;

// Environment overrides
pub const ENV_FISCAL_YEAR: &str = "ZIP_SPEND_FISCAL_YEAR";
pub const ENV_TOP_N: &str = "ZIP_SPEND_TOP_N";
pub const ENV_GEOCODE_INTERVAL_MS: &str = "ZIP_SPEND_GEOCODE_INTERVAL_MS";
pub const ENV_USER_AGENT: &str = "ZIP_SPEND_USER_AGENT";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
