//! Scored claim data structures

use crate::feature_extractor::DerivedFeatures;
use crate::rules::RuleKind;
use crate::types::claim::ClaimRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label assigned by the outlier ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyLabel {
    Inlier,
    Outlier,
}

impl AnomalyLabel {
    pub fn is_outlier(self) -> bool {
        self == AnomalyLabel::Outlier
    }
}

/// Fraud category assigned to a flagged claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FraudType {
    #[serde(rename = "Ghost Billing")]
    GhostBilling,
    #[serde(rename = "Up-coding")]
    Upcoding,
    #[serde(rename = "Identity Misuse")]
    IdentityMisuse,
    #[serde(rename = "Fake Admission")]
    FakeAdmission,
    #[serde(rename = "Anomalous Pattern")]
    AnomalousPattern,
}

impl FraudType {
    pub const ALL: [FraudType; 5] = [
        FraudType::GhostBilling,
        FraudType::Upcoding,
        FraudType::IdentityMisuse,
        FraudType::FakeAdmission,
        FraudType::AnomalousPattern,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FraudType::GhostBilling => "Ghost Billing",
            FraudType::Upcoding => "Up-coding",
            FraudType::IdentityMisuse => "Identity Misuse",
            FraudType::FakeAdmission => "Fake Admission",
            FraudType::AnomalousPattern => "Anomalous Pattern",
        }
    }
}

impl fmt::Display for FraudType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Triage status shown to auditors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReviewStatus {
    Safe,
    Investigating,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl ReviewStatus {
    /// Determine review status from a suspicion score (0-100) and thresholds
    pub fn from_score(suspicion_score: u8, thresholds: &ReviewThresholds) -> Self {
        if suspicion_score >= thresholds.high_risk {
            ReviewStatus::HighRisk
        } else if suspicion_score >= thresholds.investigating {
            ReviewStatus::Investigating
        } else {
            ReviewStatus::Safe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewStatus::Safe => "Safe",
            ReviewStatus::Investigating => "Investigating",
            ReviewStatus::HighRisk => "High Risk",
        }
    }
}

/// Configurable suspicion-score thresholds for the review status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewThresholds {
    pub investigating: u8,
    pub high_risk: u8,
}

impl Default for ReviewThresholds {
    fn default() -> Self {
        Self {
            investigating: 40,
            high_risk: 70,
        }
    }
}

/// A claim with every derived and scoring field populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredClaim {
    #[serde(flatten)]
    pub claim: ClaimRecord,

    #[serde(flatten)]
    pub features: DerivedFeatures,

    /// Deterministic rule indicator
    #[serde(with = "binary_flag")]
    pub rule_fraud: bool,

    /// Rules that fired, in evaluation order
    pub triggered_rules: Vec<RuleKind>,

    pub anomaly_label: AnomalyLabel,

    /// Fused risk (0.0 - 1.0, two decimals)
    pub risk_score: f64,

    #[serde(with = "binary_flag")]
    pub fraud_flag: bool,

    /// `risk_score` on a 0-100 scale
    pub suspicion_score: u8,

    pub review_status: ReviewStatus,

    /// Present only on flagged claims
    pub fraud_type: Option<FraudType>,

    /// Empty unless the claim is flagged
    pub justification: String,
}

/// Serializes booleans as `0`/`1` to match the tabular output contract.
mod binary_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(deserializer)? != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_status_from_score() {
        let thresholds = ReviewThresholds::default();

        assert_eq!(ReviewStatus::from_score(0, &thresholds), ReviewStatus::Safe);
        assert_eq!(ReviewStatus::from_score(39, &thresholds), ReviewStatus::Safe);
        assert_eq!(ReviewStatus::from_score(40, &thresholds), ReviewStatus::Investigating);
        assert_eq!(ReviewStatus::from_score(60, &thresholds), ReviewStatus::Investigating);
        assert_eq!(ReviewStatus::from_score(90, &thresholds), ReviewStatus::HighRisk);
    }

    #[test]
    fn test_fraud_type_labels_match_serialization() {
        for fraud_type in FraudType::ALL {
            let json = serde_json::to_string(&fraud_type).unwrap();
            assert_eq!(json, format!("\"{}\"", fraud_type.label()));
        }
    }

    #[test]
    fn test_scored_claim_serializes_flags_as_integers() {
        let scored = ScoredClaim {
            claim: ClaimRecord::new("TXN-9").with_billing(30000.0, 10000.0),
            features: DerivedFeatures {
                length_of_stay: 3,
                preauth_delay: 0,
                cost_to_package: 3.0,
                hospital_avg_cost: 30000.0,
                patient_claim_count: 1,
            },
            rule_fraud: true,
            triggered_rules: vec![RuleKind::CostRatioCap],
            anomaly_label: AnomalyLabel::Inlier,
            risk_score: 0.6,
            fraud_flag: true,
            suspicion_score: 60,
            review_status: ReviewStatus::Investigating,
            fraud_type: Some(FraudType::Upcoding),
            justification: "text".to_string(),
        };

        let value = serde_json::to_value(&scored).unwrap();

        assert_eq!(value["rule_fraud"], 1);
        assert_eq!(value["fraud_flag"], 1);
        assert_eq!(value["anomaly_label"], "inlier");
        assert_eq!(value["fraud_type"], "Up-coding");
        assert_eq!(value["review_status"], "Investigating");
        assert_eq!(value["triggered_rules"][0], "cost_ratio_cap");
        assert_eq!(value["transaction_id"], "TXN-9");
        assert_eq!(value["length_of_stay"], 3);

        let back: ScoredClaim = serde_json::from_value(value).unwrap();
        assert_eq!(back, scored);
    }
}
