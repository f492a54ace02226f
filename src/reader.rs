//! Claim batch ingestion from JSON files.
//!
//! Accepts either a single JSON array of claims or one claim object per line.
//! Lines that fail to parse are logged and skipped.

use crate::types::claim::ClaimRecord;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Load a claim batch from `path`
pub fn load_claims<P: AsRef<Path>>(path: P) -> Result<Vec<ClaimRecord>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read claims from {}", path.display()))?;

    let claims = parse_claims(&contents)
        .with_context(|| format!("Failed to parse claims from {}", path.display()))?;
    debug!(path = %path.display(), claims = claims.len(), "Claims loaded");
    Ok(claims)
}

/// Parse a JSON array or JSON-lines document
pub fn parse_claims(contents: &str) -> Result<Vec<ClaimRecord>> {
    let trimmed = contents.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid JSON array of claims");
    }

    let mut claims = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<ClaimRecord>(line) {
            Ok(claim) => claims.push(claim),
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping malformed claim");
            }
        }
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_json_array() {
        let claims = parse_claims(
            r#"[
                {"TransactionID": "T1", "Hospital_PIN": 501, "Final_Billed_Amount": 30000, "Base_Package_Rate": 10000},
                {"transaction_id": "T2", "billed_amount": 1200.5}
            ]"#,
        )
        .unwrap();

        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].hospital_id.as_deref(), Some("501"));
        assert_eq!(claims[0].base_package_rate, Some(10000.0));
        assert_eq!(claims[1].billed_amount, Some(1200.5));
    }

    #[test]
    fn test_parse_jsonl_skips_blank_and_malformed_lines() {
        let claims = parse_claims(
            "{\"TransactionID\": \"T1\"}\n\nnot json\n{\"TransactionID\": \"T2\", \"Age\": 40}\n",
        )
        .unwrap();

        assert_eq!(claims.len(), 2);
        assert_eq!(claims[1].transaction_id.as_deref(), Some("T2"));
        assert_eq!(claims[1].age, Some(40));
    }

    #[test]
    fn test_loosely_typed_values_do_not_reject_the_batch() {
        let records = [
            r#"{"TransactionID": "T1", "Age": 34.0, "Final_Billed_Amount": 30000}"#,
            r#"{"TransactionID": "T2", "Final_Billed_Amount": "25000", "Base_Package_Rate": ""}"#,
            r#"{"TransactionID": "T3", "Gender": null, "Base_Package_Rate": 0}"#,
        ];

        let from_array = parse_claims(&format!("[{}]", records.join(","))).unwrap();
        let from_lines = parse_claims(&records.join("\n")).unwrap();

        assert_eq!(from_array.len(), 3);
        assert_eq!(from_array, from_lines);
        assert_eq!(from_array[0].age, Some(34));
        assert_eq!(from_array[1].billed_amount, Some(25000.0));
        assert_eq!(from_array[1].base_package_rate, None);
        assert_eq!(from_array[2].base_package_rate, Some(0.0));
    }

    #[test]
    fn test_malformed_array_is_an_error() {
        assert!(parse_claims("[{\"TransactionID\": \"T1\"},").is_err());
    }

    #[test]
    fn test_load_claims_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"TransactionID\": \"T1\", \"PatientID\": \"P1\"}}").unwrap();
        writeln!(file, "{{\"TransactionID\": \"T2\", \"PatientID\": \"P1\"}}").unwrap();

        let claims = load_claims(file.path()).unwrap();

        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].patient_id.as_deref(), Some("P1"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_claims("/nonexistent/claims.jsonl").unwrap_err();
        assert!(err.to_string().contains("Failed to read claims"));
    }
}
