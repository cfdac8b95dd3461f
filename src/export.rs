use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Serialize `value` as JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Write the artifact to `path`, creating parent directories.
pub fn write_json_file<T: Serialize + ?Sized>(value: &T, path: &Path, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_json(value, pretty)?)?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized, W: Write>(value: &T, mut out: W, pretty: bool) -> Result<()> {
    writeln!(out, "{}", to_json(value, pretty)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnrichedEntry, EnrichedResult};
    use rust_decimal_macros::dec;

    fn sample() -> EnrichedResult {
        EnrichedResult::from(vec![EnrichedEntry {
            postal_code: "21201".to_string(),
            total_amount: dec!(1500000.75),
            latitude: 39.0,
            longitude: -77.0,
        }])
    }

    #[test]
    fn test_artifact_shape() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&sample(), false).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "postalCode": "21201",
                "totalAmount": "1500000.75",
                "latitude": 39.0,
                "longitude": -77.0
            }])
        );
    }

    #[test]
    fn test_empty_result_is_empty_array() {
        assert_eq!(to_json(&EnrichedResult::empty(), false).unwrap(), "[]");
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("map-data.json");

        write_json_file(&sample(), &path, true).unwrap();

        let back: EnrichedResult = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_write_to_writer_appends_newline() {
        let mut buf = Vec::new();
        write_json(&EnrichedResult::empty(), &mut buf, false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[]\n");
    }
}
