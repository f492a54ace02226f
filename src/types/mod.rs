//! Type definitions for the claim scoring pipeline

pub mod claim;
pub mod scored;

pub use claim::ClaimRecord;
pub use scored::{AnomalyLabel, FraudType, ReviewStatus, ReviewThresholds, ScoredClaim};
