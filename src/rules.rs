//! Deterministic fraud heuristics.
//!
//! Every rule is evaluated for every claim; any single hit sets the rule
//! indicator. Rules are pure functions of the derived claim.

use crate::config::RulesConfig;
use crate::feature_extractor::DerivedClaim;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Package rate recorded as exactly zero
    ZeroPackageRate,
    /// Billed amount above the allowed multiple of the package rate
    CostRatioCap,
    /// Discharge on or before the admission day
    NonPositiveStay,
    /// Male patient billed under a maternity diagnosis
    GenderDiagnosisMismatch,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::ZeroPackageRate,
        RuleKind::CostRatioCap,
        RuleKind::NonPositiveStay,
        RuleKind::GenderDiagnosisMismatch,
    ];
}

/// Result of running the rule set on one claim
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub triggered: Vec<RuleKind>,
}

impl RuleOutcome {
    pub fn is_fraud(&self) -> bool {
        !self.triggered.is_empty()
    }
}

pub struct RuleEngine {
    config: RulesConfig,
}

impl RuleEngine {
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    /// Evaluate all rules against one claim
    pub fn evaluate(&self, claim: &DerivedClaim) -> RuleOutcome {
        RuleOutcome {
            triggered: RuleKind::ALL
                .into_iter()
                .filter(|&rule| self.matches(rule, claim))
                .collect(),
        }
    }

    pub fn matches(&self, rule: RuleKind, claim: &DerivedClaim) -> bool {
        match rule {
            RuleKind::ZeroPackageRate => claim.claim.base_package_rate == Some(0.0),
            RuleKind::CostRatioCap => claim.features.cost_to_package > self.config.cost_ratio_cap,
            RuleKind::NonPositiveStay => claim.features.length_of_stay <= 0,
            RuleKind::GenderDiagnosisMismatch => {
                claim.claim.gender.as_deref() == Some(self.config.male_label.as_str())
                    && claim.claim.primary_diagnosis.as_deref()
                        == Some(self.config.maternity_diagnosis.as_str())
            }
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(RulesConfig::default())
    }
}
