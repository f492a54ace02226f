//! Outlier detection and risk fusion

pub mod aggregator;
pub mod detector;
pub mod isolation_forest;

pub use aggregator::{RiskAssessment, RiskFusion};
pub use detector::{AnomalyDetector, OutlierStage};
pub use isolation_forest::IsolationForest;
