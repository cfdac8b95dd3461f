//! U.S. postal code checks.

use crate::constants::POSTAL_CODE_LENGTH;
use once_cell::sync::Lazy;
use regex::Regex;

static POSTAL_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}$").expect("postal code regex is valid"));

/// True iff `code` is exactly five ASCII decimal digits.
pub fn is_valid(code: &str) -> bool {
    POSTAL_CODE_RE.is_match(code)
}

/// Left-pads an all-digit code shorter than five characters with zeros.
/// Anything else is returned unchanged.
pub fn normalize(code: &str) -> String {
    let code = code.trim();
    if code.len() < POSTAL_CODE_LENGTH
        && !code.is_empty()
        && code.bytes().all(|b| b.is_ascii_digit())
    {
        format!("{:0>width$}", code, width = POSTAL_CODE_LENGTH)
    } else {
        code.to_string()
    }
}
