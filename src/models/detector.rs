//! Anomaly detector interface and the batch outlier stage

use crate::config::DetectionConfig;
use crate::error::AnomalyError;
use crate::feature_extractor::{DerivedClaim, FeatureExtractor};
use crate::models::isolation_forest::IsolationForest;
use crate::types::scored::AnomalyLabel;
use ndarray::{Array1, Array2};
use tracing::{debug, info};

/// Unsupervised detector fitted on a feature matrix
pub trait AnomalyDetector {
    /// Fit the detector on training data
    fn fit(&mut self, x: &Array2<f64>) -> Result<(), AnomalyError>;

    /// Anomaly scores for each row (higher = more anomalous)
    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>, AnomalyError>;

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<AnomalyLabel>, AnomalyError>;

    /// Fit and predict in one step
    fn fit_predict(&mut self, x: &Array2<f64>) -> Result<Vec<AnomalyLabel>, AnomalyError> {
        self.fit(x)?;
        self.predict(x)
    }

    /// Score above which a row is an outlier, once fitted
    fn threshold(&self) -> Option<f64>;
}

/// Labels a derived batch with a freshly fitted isolation forest.
///
/// A new forest is fitted on every call, so labels are only comparable
/// within one batch.
pub struct OutlierStage {
    config: DetectionConfig,
    extractor: FeatureExtractor,
}

impl OutlierStage {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            extractor: FeatureExtractor::new(),
        }
    }

    pub fn label_batch(&self, claims: &[DerivedClaim]) -> Result<Vec<AnomalyLabel>, AnomalyError> {
        let columns = self.extractor.present_columns(claims);
        let matrix = self.extractor.feature_matrix(claims, &columns);

        debug!(
            rows = matrix.nrows(),
            columns = ?self.extractor.feature_names(&columns),
            "Fitting isolation forest"
        );

        let mut forest = IsolationForest::from_config(&self.config);
        let labels = forest.fit_predict(&matrix)?;

        info!(
            claims = labels.len(),
            outliers = labels.iter().filter(|label| label.is_outlier()).count(),
            contamination = self.config.contamination,
            n_estimators = self.config.n_estimators,
            "Outlier labelling complete"
        );

        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClaimRecord;

    fn batch(n: usize) -> Vec<DerivedClaim> {
        let claims = (0..n)
            .map(|i| {
                ClaimRecord::new(format!("T{i}"))
                    .with_hospital(format!("H{}", i % 3))
                    .with_billing(20000.0 + (i % 10) as f64 * 500.0, 15000.0)
            })
            .collect();
        FeatureExtractor::new().derive_batch(claims)
    }

    #[test]
    fn test_label_batch_returns_one_label_per_claim() {
        let stage = OutlierStage::new(DetectionConfig::default());
        let claims = batch(40);

        let labels = stage.label_batch(&claims).unwrap();

        assert_eq!(labels.len(), 40);
    }

    #[test]
    fn test_single_claim_cannot_be_labelled() {
        let stage = OutlierStage::new(DetectionConfig::default());

        assert_eq!(
            stage.label_batch(&batch(1)),
            Err(AnomalyError::InsufficientSamples(1))
        );
    }

    #[test]
    fn test_labels_are_stable_across_calls() {
        let stage = OutlierStage::new(DetectionConfig::default());
        let claims = batch(50);

        assert_eq!(
            stage.label_batch(&claims).unwrap(),
            stage.label_batch(&claims).unwrap()
        );
    }
}
