//! Fraud-type classification for flagged claims.
//!
//! Categories are tried in a fixed priority order and the first matching
//! predicate wins. The order encodes audit priority: a zero package rate
//! outranks a cost breach, which outranks identity reuse, which outranks
//! a fabricated stay. A male maternity claim has no dedicated category and
//! falls through to [`FraudType::AnomalousPattern`].

use crate::feature_extractor::DerivedClaim;
use crate::types::scored::FraudType;

type Predicate = fn(&Classifier, &DerivedClaim) -> bool;

/// Priority-ordered (predicate, category) pairs
const DECISION_LIST: [(Predicate, FraudType); 4] = [
    (Classifier::is_ghost_billing, FraudType::GhostBilling),
    (Classifier::is_upcoding, FraudType::Upcoding),
    (Classifier::is_identity_misuse, FraudType::IdentityMisuse),
    (Classifier::is_fake_admission, FraudType::FakeAdmission),
];

pub struct Classifier {
    cost_ratio_cap: f64,
    /// Claims per patient above which identity reuse is suspected
    repeat_claim_limit: u32,
}

impl Classifier {
    pub fn new(cost_ratio_cap: f64) -> Self {
        Self {
            cost_ratio_cap,
            repeat_claim_limit: 2,
        }
    }

    /// Category for a claim; always returns one, falling back to
    /// [`FraudType::AnomalousPattern`]
    pub fn classify(&self, claim: &DerivedClaim) -> FraudType {
        DECISION_LIST
            .iter()
            .find(|(predicate, _)| predicate(self, claim))
            .map(|&(_, fraud_type)| fraud_type)
            .unwrap_or(FraudType::AnomalousPattern)
    }

    /// The categories in the order they are tried
    pub fn priority(&self) -> Vec<FraudType> {
        DECISION_LIST
            .iter()
            .map(|&(_, fraud_type)| fraud_type)
            .chain(std::iter::once(FraudType::AnomalousPattern))
            .collect()
    }

    fn is_ghost_billing(&self, claim: &DerivedClaim) -> bool {
        claim.claim.base_package_rate == Some(0.0)
    }

    fn is_upcoding(&self, claim: &DerivedClaim) -> bool {
        claim.features.cost_to_package > self.cost_ratio_cap
    }

    fn is_identity_misuse(&self, claim: &DerivedClaim) -> bool {
        claim.features.patient_claim_count > self.repeat_claim_limit
    }

    fn is_fake_admission(&self, claim: &DerivedClaim) -> bool {
        claim.features.length_of_stay <= 0
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(2.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::DerivedFeatures;
    use crate::types::ClaimRecord;

    fn claim(package_rate: Option<f64>, cost_ratio: f64, claims: u32, stay: i64) -> DerivedClaim {
        DerivedClaim {
            claim: ClaimRecord {
                base_package_rate: package_rate,
                ..ClaimRecord::new("T1")
            },
            features: DerivedFeatures {
                length_of_stay: stay,
                preauth_delay: 0,
                cost_to_package: cost_ratio,
                hospital_avg_cost: 0.0,
                patient_claim_count: claims,
            },
        }
    }

    #[test]
    fn test_each_category() {
        let classifier = Classifier::default();

        assert_eq!(classifier.classify(&claim(Some(0.0), 1.0, 1, 2)), FraudType::GhostBilling);
        assert_eq!(classifier.classify(&claim(Some(100.0), 3.0, 1, 2)), FraudType::Upcoding);
        assert_eq!(classifier.classify(&claim(Some(100.0), 1.0, 3, 2)), FraudType::IdentityMisuse);
        assert_eq!(classifier.classify(&claim(Some(100.0), 1.0, 1, 0)), FraudType::FakeAdmission);
        assert_eq!(classifier.classify(&claim(Some(100.0), 1.0, 1, 2)), FraudType::AnomalousPattern);
    }

    #[test]
    fn test_first_match_wins() {
        let classifier = Classifier::default();

        // every predicate true
        assert_eq!(classifier.classify(&claim(Some(0.0), 9.0, 5, -1)), FraudType::GhostBilling);
        // cost breach outranks identity reuse and stay
        assert_eq!(classifier.classify(&claim(Some(100.0), 9.0, 5, -1)), FraudType::Upcoding);
        // identity reuse outranks a non-positive stay
        assert_eq!(classifier.classify(&claim(Some(100.0), 1.0, 5, 0)), FraudType::IdentityMisuse);
    }

    #[test]
    fn test_boundaries_are_strict() {
        let classifier = Classifier::default();

        assert_eq!(classifier.classify(&claim(Some(100.0), 2.5, 2, 1)), FraudType::AnomalousPattern);
        assert_eq!(classifier.classify(&claim(None, 1.0, 1, 1)), FraudType::AnomalousPattern);
    }

    #[test]
    fn test_gender_diagnosis_mismatch_falls_through() {
        let classifier = Classifier::default();
        let mut mismatch = claim(Some(20000.0), 1.0, 1, 3);
        mismatch.claim.gender = Some("Male".to_string());
        mismatch.claim.primary_diagnosis = Some("Maternity Care".to_string());

        assert_eq!(classifier.classify(&mismatch), FraudType::AnomalousPattern);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(Classifier::default().priority(), FraudType::ALL.to_vec());
    }
}
