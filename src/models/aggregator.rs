//! Fusion of rule, anomaly and cost-ratio signals into one risk score

use crate::types::scored::AnomalyLabel;

/// Weight of each binary signal in the fused score
#[derive(Debug, Clone, Copy, PartialEq)]
struct FusionWeights {
    rule: f64,
    anomaly: f64,
    cost_excess: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            rule: 0.5,
            anomaly: 0.4,
            cost_excess: 0.1,
        }
    }
}

/// Fused risk for one claim
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    /// Weighted sum rounded to two decimals
    pub risk_score: f64,
    pub fraud_flag: bool,
    /// `risk_score` on a 0-100 scale
    pub suspicion_score: u8,
}

/// Combines the three binary signals with fixed weights. The rule term
/// alone lands exactly on the flag threshold and does not flag; it needs a
/// second signal.
pub struct RiskFusion {
    weights: FusionWeights,
    /// Cost-to-package ratio above which the minor cost term fires
    cost_ratio_threshold: f64,
    /// Scores strictly above this are flagged
    flag_threshold: f64,
}

impl RiskFusion {
    pub fn fuse(&self, rule_fraud: bool, anomaly: AnomalyLabel, cost_to_package: f64) -> RiskAssessment {
        let raw = self.weights.rule * indicator(rule_fraud)
            + self.weights.anomaly * indicator(anomaly.is_outlier())
            + self.weights.cost_excess * indicator(cost_to_package > self.cost_ratio_threshold);
        let risk_score = round2(raw.clamp(0.0, 1.0));

        RiskAssessment {
            risk_score,
            fraud_flag: risk_score > self.flag_threshold,
            suspicion_score: (risk_score * 100.0).round() as u8,
        }
    }

    /// Every score the fusion can produce, ascending
    pub fn attainable_scores(&self) -> Vec<f64> {
        let mut scores: Vec<f64> = (0..8u8)
            .map(|bits| {
                let label = if bits & 2 != 0 {
                    AnomalyLabel::Outlier
                } else {
                    AnomalyLabel::Inlier
                };
                let cost_ratio = if bits & 4 != 0 { f64::INFINITY } else { 0.0 };
                self.fuse(bits & 1 != 0, label, cost_ratio).risk_score
            })
            .collect();
        scores.sort_by(|a, b| a.total_cmp(b));
        scores.dedup();
        scores
    }

}

impl Default for RiskFusion {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            cost_ratio_threshold: 2.0,
            flag_threshold: 0.5,
        }
    }
}

fn indicator(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
