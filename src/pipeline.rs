//! End-to-end batch scoring.
//!
//! Stages run in a fixed order over the whole batch: feature derivation,
//! rule evaluation, outlier labelling, then per-claim fusion, classification
//! and justification. Output records keep the input order.

use crate::classifier::Classifier;
use crate::config::{AppConfig, DetectionConfig};
use crate::error::Result;
use crate::feature_extractor::{DerivedClaim, FeatureExtractor};
use crate::justification::{JustificationContext, JustificationEnricher};
use crate::metrics::{BatchSummary, StageTimings};
use crate::models::aggregator::RiskFusion;
use crate::models::detector::OutlierStage;
use crate::rules::{RuleEngine, RuleOutcome};
use crate::types::claim::ClaimRecord;
use crate::types::scored::{AnomalyLabel, ReviewStatus, ReviewThresholds, ScoredClaim};
use std::time::Instant;
use tracing::{debug, info};

/// Scores claim batches. Holds no state between batches.
pub struct ScoringPipeline {
    extractor: FeatureExtractor,
    rules: RuleEngine,
    outliers: OutlierStage,
    fusion: RiskFusion,
    classifier: Classifier,
    review: ReviewThresholds,
    cost_ratio_cap: f64,
}

impl ScoringPipeline {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            rules: RuleEngine::new(config.rules.clone()),
            outliers: OutlierStage::new(config.detection.clone()),
            fusion: RiskFusion::default(),
            classifier: Classifier::new(config.rules.cost_ratio_cap),
            review: config.review.clone(),
            cost_ratio_cap: config.rules.cost_ratio_cap,
        }
    }

    /// Replace the outlier stage settings
    pub fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.outliers = OutlierStage::new(detection);
        self
    }

    /// Score a batch.
    ///
    /// An empty batch yields an empty result. A batch of one claim cannot
    /// train the outlier model and fails with
    /// [`PipelineError::AnomalyDetection`](crate::error::PipelineError::AnomalyDetection).
    pub fn score_batch(&self, claims: Vec<ClaimRecord>) -> Result<ScoredBatch> {
        if claims.is_empty() {
            debug!("Empty batch, nothing to score");
            return Ok(ScoredBatch::default());
        }

        let mut timings = StageTimings::default();

        let started = Instant::now();
        let derived = self.extractor.derive_batch(claims);
        timings.features = started.elapsed();

        let started = Instant::now();
        let outcomes: Vec<RuleOutcome> = derived.iter().map(|claim| self.rules.evaluate(claim)).collect();
        timings.rules = started.elapsed();

        let started = Instant::now();
        let labels = self.outliers.label_batch(&derived)?;
        timings.anomaly = started.elapsed();

        let started = Instant::now();
        let records: Vec<ScoredClaim> = derived
            .into_iter()
            .zip(outcomes)
            .zip(labels)
            .map(|((claim, outcome), label)| self.score_claim(claim, outcome, label))
            .collect();
        timings.scoring = started.elapsed();

        info!(
            claims = records.len(),
            flagged = records.iter().filter(|record| record.fraud_flag).count(),
            elapsed_ms = timings.total().as_millis() as u64,
            "Batch scored"
        );

        Ok(ScoredBatch { records, timings })
    }

    fn score_claim(&self, claim: DerivedClaim, outcome: RuleOutcome, label: AnomalyLabel) -> ScoredClaim {
        let rule_fraud = outcome.is_fraud();
        let assessment = self
            .fusion
            .fuse(rule_fraud, label, claim.features.cost_to_package);

        let (fraud_type, justification) = if assessment.fraud_flag {
            let fraud_type = self.classifier.classify(&claim);
            let ctx = JustificationContext::new(&claim, assessment.risk_score, self.cost_ratio_cap);
            (Some(fraud_type), fraud_type.justify(&ctx))
        } else {
            (None, String::new())
        };

        ScoredClaim {
            claim: claim.claim,
            features: claim.features,
            rule_fraud,
            triggered_rules: outcome.triggered,
            anomaly_label: label,
            risk_score: assessment.risk_score,
            fraud_flag: assessment.fraud_flag,
            suspicion_score: assessment.suspicion_score,
            review_status: ReviewStatus::from_score(assessment.suspicion_score, &self.review),
            fraud_type,
            justification,
        }
    }
}

/// Scored records of one batch, in input order
#[derive(Debug, Clone, Default)]
pub struct ScoredBatch {
    records: Vec<ScoredClaim>,
    timings: StageTimings,
}

impl ScoredBatch {
    pub fn records(&self) -> &[ScoredClaim] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flagged records, in input order
    pub fn flagged(&self) -> impl Iterator<Item = &ScoredClaim> {
        self.records.iter().filter(|record| record.fraud_flag)
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_records(&self.records)
    }

    pub fn timings(&self) -> &StageTimings {
        &self.timings
    }

    /// Let `enricher` rewrite justifications of flagged records. Returns
    /// how many were replaced; unflagged records are never touched.
    pub fn enrich_justifications(&mut self, enricher: &dyn JustificationEnricher) -> usize {
        let mut replaced = 0;
        for record in self.records.iter_mut().filter(|record| record.fraud_flag) {
            if let Some(text) = enricher.enrich(record) {
                record.justification = text;
                replaced += 1;
            }
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnomalyError, PipelineError};
    use crate::types::scored::FraudType;

    fn normal_batch(n: usize) -> Vec<ClaimRecord> {
        (0..n)
            .map(|i| {
                ClaimRecord::new(format!("TXN-{i}"))
                    .with_patient(format!("PAT-{i}"))
                    .with_hospital(format!("HOSP-{}", i % 4))
                    .with_billing(20000.0 + (i % 7) as f64 * 250.0, 20000.0)
            })
            .collect()
    }

    struct Uppercase;

    impl JustificationEnricher for Uppercase {
        fn enrich(&self, claim: &ScoredClaim) -> Option<String> {
            Some(claim.justification.to_uppercase())
        }
    }

    #[test]
    fn test_empty_batch() {
        let pipeline = ScoringPipeline::new(&AppConfig::default());

        let batch = pipeline.score_batch(Vec::new()).unwrap();

        assert!(batch.is_empty());
        assert_eq!(batch.summary().total_claims, 0);
    }

    #[test]
    fn test_single_claim_batch_fails() {
        let pipeline = ScoringPipeline::new(&AppConfig::default());

        let err = pipeline.score_batch(normal_batch(1)).unwrap_err();

        assert_eq!(
            err,
            PipelineError::AnomalyDetection(AnomalyError::InsufficientSamples(1))
        );
    }

    #[test]
    fn test_order_preserved_and_unflagged_have_no_justification() {
        let pipeline = ScoringPipeline::new(&AppConfig::default());

        let batch = pipeline.score_batch(normal_batch(30)).unwrap();

        assert_eq!(batch.len(), 30);
        for (i, record) in batch.records().iter().enumerate() {
            assert_eq!(record.claim.transaction_id.as_deref(), Some(format!("TXN-{i}").as_str()));
            if !record.fraud_flag {
                assert!(record.justification.is_empty());
                assert_eq!(record.fraud_type, None);
            }
        }
    }

    #[test]
    fn test_upcoded_claim_is_flagged_and_justified() {
        let pipeline = ScoringPipeline::new(&AppConfig::default());
        let mut claims = normal_batch(30);
        claims.push(
            ClaimRecord::new("TXN-UP")
                .with_patient("PAT-UP")
                .with_hospital("HOSP-0")
                .with_billing(90000.0, 20000.0),
        );

        let batch = pipeline.score_batch(claims).unwrap();
        let record = &batch.records()[30];

        assert!(record.fraud_flag);
        assert_eq!(record.fraud_type, Some(FraudType::Upcoding));
        assert!(record.justification.starts_with("UP-CODING"));
        assert!(batch.flagged().any(|flagged| flagged.claim.transaction_id.as_deref() == Some("TXN-UP")));
    }

    #[test]
    fn test_enrichment_only_touches_flagged() {
        let pipeline = ScoringPipeline::new(&AppConfig::default());
        let mut claims = normal_batch(20);
        claims.push(ClaimRecord::new("TXN-UP").with_billing(80000.0, 20000.0));

        let mut batch = pipeline.score_batch(claims).unwrap();
        let flagged = batch.flagged().count();
        let replaced = batch.enrich_justifications(&Uppercase);

        assert_eq!(replaced, flagged);
        for record in batch.records() {
            if record.fraud_flag {
                assert_eq!(record.justification, record.justification.to_uppercase());
            } else {
                assert!(record.justification.is_empty());
            }
        }
    }
}
