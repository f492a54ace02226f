//! Raw claim record as supplied by the hosting application

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// One reimbursement claim. Every column is optional; absent or unparsable
/// values are kept as `None` and resolved to defaults during feature derivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    #[serde(default, alias = "TransactionID", deserialize_with = "lenient_id")]
    pub transaction_id: Option<String>,

    #[serde(default, alias = "PatientID", deserialize_with = "lenient_id")]
    pub patient_id: Option<String>,

    /// Hospital PIN, or the generic hospital identifier when no PIN is recorded
    #[serde(
        default,
        alias = "Hospital_PIN",
        alias = "HospitalID",
        deserialize_with = "lenient_id"
    )]
    pub hospital_id: Option<String>,

    #[serde(default, alias = "Age", deserialize_with = "lenient_age")]
    pub age: Option<u32>,

    #[serde(default, alias = "Gender", deserialize_with = "lenient_text")]
    pub gender: Option<String>,

    #[serde(default, alias = "Primary_Diagnosis", deserialize_with = "lenient_text")]
    pub primary_diagnosis: Option<String>,

    /// Final billed amount in rupees (falls back to the treatment cost column)
    #[serde(
        default,
        alias = "Final_Billed_Amount",
        alias = "TreatmentCost",
        deserialize_with = "lenient_amount"
    )]
    pub billed_amount: Option<f64>,

    /// Approved package rate; zero is a legitimate (and suspicious) value
    #[serde(default, alias = "Base_Package_Rate", deserialize_with = "lenient_amount")]
    pub base_package_rate: Option<f64>,

    #[serde(
        default,
        alias = "Admission_Timestamp",
        deserialize_with = "lenient_timestamp"
    )]
    pub admitted_at: Option<NaiveDateTime>,

    #[serde(
        default,
        alias = "Discharge_Timestamp",
        deserialize_with = "lenient_timestamp"
    )]
    pub discharged_at: Option<NaiveDateTime>,

    #[serde(
        default,
        alias = "PreAuth_Request_Date",
        deserialize_with = "lenient_timestamp"
    )]
    pub preauth_requested_at: Option<NaiveDateTime>,

    #[serde(
        default,
        alias = "PreAuth_Approval_Date",
        deserialize_with = "lenient_timestamp"
    )]
    pub preauth_approved_at: Option<NaiveDateTime>,
}

impl ClaimRecord {
    /// Create an otherwise empty claim with a transaction identifier
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: Some(transaction_id.into()),
            ..Self::default()
        }
    }

    pub fn with_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn with_hospital(mut self, hospital_id: impl Into<String>) -> Self {
        self.hospital_id = Some(hospital_id.into());
        self
    }

    pub fn with_demographics(mut self, age: u32, gender: impl Into<String>) -> Self {
        self.age = Some(age);
        self.gender = Some(gender.into());
        self
    }

    pub fn with_diagnosis(mut self, diagnosis: impl Into<String>) -> Self {
        self.primary_diagnosis = Some(diagnosis.into());
        self
    }

    /// Set billed amount and package rate together
    pub fn with_billing(mut self, billed_amount: f64, base_package_rate: f64) -> Self {
        self.billed_amount = Some(billed_amount);
        self.base_package_rate = Some(base_package_rate);
        self
    }

    pub fn with_stay(mut self, admitted_at: NaiveDateTime, discharged_at: NaiveDateTime) -> Self {
        self.admitted_at = Some(admitted_at);
        self.discharged_at = Some(discharged_at);
        self
    }

    pub fn with_preauth(mut self, requested_at: NaiveDateTime, approved_at: NaiveDateTime) -> Self {
        self.preauth_requested_at = Some(requested_at);
        self.preauth_approved_at = Some(approved_at);
        self
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Parse a timestamp in any of the accepted layouts.
///
/// Offset-carrying values are normalised to UTC. Returns `None` for
/// anything unrecognised.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Other(IgnoredAny),
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimestamp::Text(text)) => parse_timestamp(&text),
        Some(RawTimestamp::Other(_)) | None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
    Float(f64),
    Other(IgnoredAny),
}

/// Identifiers arrive as strings or as bare numbers depending on the export.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawId::Text(text)) if !text.trim().is_empty() => Some(text),
        Some(RawId::Integer(value)) => Some(value.to_string()),
        Some(RawId::Float(value)) if value.is_finite() => Some(value.to_string()),
        _ => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl RawNumber {
    /// Finite value, parsing numeric strings
    fn value(self) -> Option<f64> {
        let value = match self {
            RawNumber::Number(value) => value,
            RawNumber::Text(text) => text.trim().parse().ok()?,
            RawNumber::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Amounts arrive as numbers or numeric strings; anything else is absent.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawNumber>::deserialize(deserializer)?.and_then(RawNumber::value))
}

/// Ages must be whole and non-negative; `34.0` and `"34"` are accepted.
fn lenient_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<RawNumber>::deserialize(deserializer)?.and_then(RawNumber::value);
    Ok(value
        .filter(|age| age.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(age))
        .map(|age| age as u32))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Other(IgnoredAny),
}

/// Non-empty strings only
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawText>::deserialize(deserializer)? {
        Some(RawText::Text(text)) if !text.trim().is_empty() => Some(text),
        _ => None,
    })
}
