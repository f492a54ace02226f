//! Batch statistics and the end-of-run summary report.

use crate::justification::format_rupees;
use crate::types::scored::{FraudType, ReviewStatus, ScoredClaim};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

/// Wall-clock time spent in each pipeline stage for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    pub features: Duration,
    pub rules: Duration,
    pub anomaly: Duration,
    /// Fusion, classification and justification
    pub scoring: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.features + self.rules + self.anomaly + self.scoring
    }
}

/// Aggregate view over a scored batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total_claims: usize,
    pub flagged_claims: usize,
    /// Claims with at least one rule hit
    pub rule_hits: usize,
    pub outliers: usize,
    pub by_fraud_type: BTreeMap<FraudType, usize>,
    pub by_review_status: BTreeMap<ReviewStatus, usize>,
    /// Claim count per suspicion score
    pub score_distribution: BTreeMap<u8, usize>,
    pub total_billed: f64,
    pub flagged_billed: f64,
}

impl BatchSummary {
    pub fn from_records(records: &[ScoredClaim]) -> Self {
        let mut summary = BatchSummary {
            total_claims: records.len(),
            ..Default::default()
        };

        for record in records {
            let billed = record.claim.billed_amount.unwrap_or(0.0);
            summary.total_billed += billed;

            if record.rule_fraud {
                summary.rule_hits += 1;
            }
            if record.anomaly_label.is_outlier() {
                summary.outliers += 1;
            }
            if record.fraud_flag {
                summary.flagged_claims += 1;
                summary.flagged_billed += billed;
            }
            if let Some(fraud_type) = record.fraud_type {
                *summary.by_fraud_type.entry(fraud_type).or_insert(0) += 1;
            }
            *summary
                .by_review_status
                .entry(record.review_status)
                .or_insert(0) += 1;
            *summary
                .score_distribution
                .entry(record.suspicion_score)
                .or_insert(0) += 1;
        }

        summary
    }

    /// Flagged share of the batch, in percent
    pub fn flag_rate(&self) -> f64 {
        if self.total_claims > 0 {
            (self.flagged_claims as f64 / self.total_claims as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self, timings: &StageTimings) {
        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            CLAIM FRAUD PIPELINE - BATCH SUMMARY              ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Claims Scored:  {:>8}  │  Flagged: {:>6} ({:>5.1}%)       ║",
            self.total_claims,
            self.flagged_claims,
            self.flag_rate()
        );
        info!(
            "║ Rule Hits:      {:>8}  │  Outliers: {:>6}                ║",
            self.rule_hits, self.outliers
        );
        info!(
            "║ Billed: {:>12}  │  Flagged Billed: {:>12}        ║",
            format_compact_rupees(self.total_billed),
            format_compact_rupees(self.flagged_billed)
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Stage Time (ms): features={:>5} rules={:>5} anomaly={:>5} scoring={:>5}",
            timings.features.as_millis(),
            timings.rules.as_millis(),
            timings.anomaly.as_millis(),
            timings.scoring.as_millis()
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Flagged by Fraud Type:                                       ║");
        for (fraud_type, count) in &self.by_fraud_type {
            let pct = percent(*count, self.flagged_claims);
            info!("║   {:18}: {:>6} ({:>5.1}%)", fraud_type.label(), count, pct);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Review Status:                                               ║");
        for (status, count) in &self.by_review_status {
            let pct = percent(*count, self.total_claims);
            info!("║   {:18}: {:>6} ({:>5.1}%)", status.label(), count, pct);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Suspicion Score Distribution:                                ║");
        for (score, count) in &self.score_distribution {
            let pct = percent(*count, self.total_claims);
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!("║   {:>3}: {:>6} ({:>5.1}%) {}", score, count, pct, bar);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Rupee amount in crore/lakh shorthand, e.g. `₹1.2 Cr`, `₹3.4 L`
pub fn format_compact_rupees(amount: f64) -> String {
    const CRORE: f64 = 10_000_000.0;
    const LAKH: f64 = 100_000.0;

    if amount.abs() >= CRORE {
        format!("₹{:.1} Cr", amount / CRORE)
    } else if amount.abs() >= LAKH {
        format!("₹{:.1} L", amount / LAKH)
    } else {
        format_rupees(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::DerivedFeatures;
    use crate::types::scored::AnomalyLabel;
    use crate::types::ClaimRecord;

    fn scored(billed: f64, score: u8, fraud_type: Option<FraudType>) -> ScoredClaim {
        let flagged = fraud_type.is_some();
        ScoredClaim {
            claim: ClaimRecord::new("T").with_billing(billed, 10000.0),
            features: DerivedFeatures {
                length_of_stay: 2,
                preauth_delay: 0,
                cost_to_package: billed / 10000.0,
                hospital_avg_cost: billed,
                patient_claim_count: 1,
            },
            rule_fraud: score >= 50,
            triggered_rules: Vec::new(),
            anomaly_label: if score == 40 || score == 90 {
                AnomalyLabel::Outlier
            } else {
                AnomalyLabel::Inlier
            },
            risk_score: f64::from(score) / 100.0,
            fraud_flag: flagged,
            suspicion_score: score,
            review_status: ReviewStatus::from_score(score, &Default::default()),
            fraud_type,
            justification: String::new(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            scored(10000.0, 0, None),
            scored(12000.0, 40, None),
            scored(30000.0, 60, Some(FraudType::Upcoding)),
            scored(50000.0, 90, Some(FraudType::Upcoding)),
            scored(8000.0, 50, None),
        ];

        let summary = BatchSummary::from_records(&records);

        assert_eq!(summary.total_claims, 5);
        assert_eq!(summary.flagged_claims, 2);
        assert_eq!(summary.rule_hits, 3);
        assert_eq!(summary.outliers, 2);
        assert_eq!(summary.by_fraud_type.get(&FraudType::Upcoding), Some(&2));
        assert_eq!(summary.by_review_status.get(&ReviewStatus::Safe), Some(&1));
        assert_eq!(summary.by_review_status.get(&ReviewStatus::Investigating), Some(&3));
        assert_eq!(summary.by_review_status.get(&ReviewStatus::HighRisk), Some(&1));
        assert_eq!(summary.score_distribution.len(), 5);
        assert_eq!(summary.total_billed, 110000.0);
        assert_eq!(summary.flagged_billed, 80000.0);
        assert!((summary.flag_rate() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_records(&[]);

        assert_eq!(summary.total_claims, 0);
        assert_eq!(summary.flag_rate(), 0.0);
        summary.print_summary(&StageTimings::default());
    }

    #[test]
    fn test_compact_rupees() {
        assert_eq!(format_compact_rupees(12_345.0), "₹12,345");
        assert_eq!(format_compact_rupees(340_000.0), "₹3.4 L");
        assert_eq!(format_compact_rupees(12_000_000.0), "₹1.2 Cr");
    }

    #[test]
    fn test_stage_timings_total() {
        let timings = StageTimings {
            features: Duration::from_millis(2),
            rules: Duration::from_millis(1),
            anomaly: Duration::from_millis(10),
            scoring: Duration::from_millis(3),
        };

        assert_eq!(timings.total(), Duration::from_millis(16));
    }
}
