//! Claim Fraud Pipeline Library
//!
//! Batch fraud scoring for health-insurance reimbursement claims: derived
//! features, deterministic rules and an isolation forest fused into a risk
//! score, with a fraud category and written justification for every
//! flagged claim.

pub mod classifier;
pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod justification;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod rules;
pub mod types;
pub mod writer;

pub use config::AppConfig;
pub use error::{AnomalyError, PipelineError};
pub use feature_extractor::FeatureExtractor;
pub use justification::JustificationEnricher;
pub use pipeline::{ScoredBatch, ScoringPipeline};
pub use types::{ClaimRecord, FraudType, ReviewStatus, ScoredClaim};
