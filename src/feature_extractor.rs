//! Feature derivation for claim scoring.
//!
//! Per-claim signals (stay length, pre-authorization delay, cost ratio) are
//! computed from the claim's own fields. Hospital and patient aggregates are
//! computed once per batch into an immutable [`BatchAggregates`] lookup and
//! consulted read-only while deriving each claim.

use crate::types::claim::ClaimRecord;
use chrono::NaiveDateTime;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SECONDS_PER_DAY: i64 = 86_400;

/// Signals derived for one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    /// Discharge minus admission in whole days (1 when either is absent)
    pub length_of_stay: i64,
    /// Pre-auth approval minus request in whole days (0 when absent)
    pub preauth_delay: i64,
    /// Billed amount over package rate (1.0 when unavailable)
    pub cost_to_package: f64,
    /// Mean billed amount of the claim's hospital within the batch
    pub hospital_avg_cost: f64,
    /// Claims filed under the same patient within the batch
    pub patient_claim_count: u32,
}

/// A claim together with its derived features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedClaim {
    #[serde(flatten)]
    pub claim: ClaimRecord,
    #[serde(flatten)]
    pub features: DerivedFeatures,
}

/// Hospital and patient aggregates over one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchAggregates {
    hospital_avg_cost: HashMap<String, f64>,
    patient_claim_count: HashMap<String, u32>,
}

impl BatchAggregates {
    /// Build the lookup in a single pass over the batch
    pub fn from_batch(claims: &[ClaimRecord]) -> Self {
        let mut hospital_totals: HashMap<&str, (f64, u32)> = HashMap::new();
        let mut patient_counts: HashMap<&str, u32> = HashMap::new();

        for claim in claims {
            if let (Some(hospital), Some(billed)) = (claim.hospital_id.as_deref(), claim.billed_amount) {
                let entry = hospital_totals.entry(hospital).or_insert((0.0, 0));
                entry.0 += billed;
                entry.1 += 1;
            }

            // Claims without a transaction id are not counted toward the patient
            if let (Some(patient), Some(_)) = (claim.patient_id.as_deref(), &claim.transaction_id) {
                *patient_counts.entry(patient).or_insert(0) += 1;
            }
        }

        Self {
            hospital_avg_cost: hospital_totals
                .into_iter()
                .map(|(hospital, (total, count))| (hospital.to_string(), total / count as f64))
                .collect(),
            patient_claim_count: patient_counts
                .into_iter()
                .map(|(patient, count)| (patient.to_string(), count))
                .collect(),
        }
    }

    /// Mean billed amount for the claim's hospital, or the claim's own amount
    pub fn hospital_avg_cost(&self, claim: &ClaimRecord) -> f64 {
        let own = claim.billed_amount.unwrap_or(0.0);
        match (claim.hospital_id.as_deref(), claim.billed_amount) {
            (Some(hospital), Some(_)) => self.hospital_avg_cost.get(hospital).copied().unwrap_or(own),
            _ => own,
        }
    }

    pub fn patient_claim_count(&self, claim: &ClaimRecord) -> u32 {
        claim
            .patient_id
            .as_deref()
            .and_then(|patient| self.patient_claim_count.get(patient).copied())
            .filter(|&count| count > 0)
            .unwrap_or(1)
    }
}

/// Numeric columns offered to the outlier ensemble, in matrix order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureColumn {
    BilledAmount,
    LengthOfStay,
    CostToPackage,
    PreauthDelay,
    HospitalAvgCost,
    PatientClaimCount,
    Age,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 7] = [
        FeatureColumn::BilledAmount,
        FeatureColumn::LengthOfStay,
        FeatureColumn::CostToPackage,
        FeatureColumn::PreauthDelay,
        FeatureColumn::HospitalAvgCost,
        FeatureColumn::PatientClaimCount,
        FeatureColumn::Age,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::BilledAmount => "billed_amount",
            FeatureColumn::LengthOfStay => "length_of_stay",
            FeatureColumn::CostToPackage => "cost_to_package",
            FeatureColumn::PreauthDelay => "preauth_delay",
            FeatureColumn::HospitalAvgCost => "hospital_avg_cost",
            FeatureColumn::PatientClaimCount => "patient_claim_count",
            FeatureColumn::Age => "age",
        }
    }

    /// Value of this column for a claim, `None` when the source field is absent
    pub fn value(self, claim: &DerivedClaim) -> Option<f64> {
        match self {
            FeatureColumn::BilledAmount => claim.claim.billed_amount,
            FeatureColumn::LengthOfStay => Some(claim.features.length_of_stay as f64),
            FeatureColumn::CostToPackage => Some(claim.features.cost_to_package),
            FeatureColumn::PreauthDelay => Some(claim.features.preauth_delay as f64),
            FeatureColumn::HospitalAvgCost => Some(claim.features.hospital_avg_cost),
            FeatureColumn::PatientClaimCount => Some(claim.features.patient_claim_count as f64),
            FeatureColumn::Age => claim.claim.age.map(f64::from),
        }
    }
}

/// Derives per-claim features from a raw batch.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Derive features for every claim in the batch, preserving order.
    pub fn derive_batch(&self, claims: Vec<ClaimRecord>) -> Vec<DerivedClaim> {
        let aggregates = BatchAggregates::from_batch(&claims);

        claims
            .into_iter()
            .map(|claim| {
                let features = self.derive(&claim, &aggregates);
                DerivedClaim { claim, features }
            })
            .collect()
    }

    /// Derive features for one claim against precomputed batch aggregates
    pub fn derive(&self, claim: &ClaimRecord, aggregates: &BatchAggregates) -> DerivedFeatures {
        DerivedFeatures {
            length_of_stay: whole_days(claim.admitted_at, claim.discharged_at).unwrap_or(1),
            preauth_delay: whole_days(claim.preauth_requested_at, claim.preauth_approved_at)
                .unwrap_or(0),
            cost_to_package: cost_to_package(claim),
            hospital_avg_cost: aggregates.hospital_avg_cost(claim),
            patient_claim_count: aggregates.patient_claim_count(claim),
        }
    }

    /// Columns available in this batch. Derived columns are always present;
    /// source columns only when at least one claim carries a value.
    pub fn present_columns(&self, claims: &[DerivedClaim]) -> Vec<FeatureColumn> {
        FeatureColumn::ALL
            .into_iter()
            .filter(|column| claims.iter().any(|claim| column.value(claim).is_some()))
            .collect()
    }

    /// Build the `[claims, columns]` matrix, zero-filling missing values.
    pub fn feature_matrix(&self, claims: &[DerivedClaim], columns: &[FeatureColumn]) -> Array2<f64> {
        Array2::from_shape_fn((claims.len(), columns.len()), |(row, col)| {
            columns[col]
                .value(&claims[row])
                .filter(|value| value.is_finite())
                .unwrap_or(0.0)
        })
    }

    /// Get feature names for a column selection
    pub fn feature_names(&self, columns: &[FeatureColumn]) -> Vec<&'static str> {
        columns.iter().map(|column| column.name()).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed whole-day difference, floored like a calendar subtraction.
pub fn whole_days(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Option<i64> {
    let (from, to) = (from?, to?);
    Some((to - from).num_seconds().div_euclid(SECONDS_PER_DAY))
}

/// Billed amount over `max(package_rate, 1)`.
///
/// A zero package rate divides by one, so the ratio equals the billed
/// amount. A claim missing either amount takes the neutral 1.0.
pub fn cost_to_package(claim: &ClaimRecord) -> f64 {
    match (claim.billed_amount, claim.base_package_rate) {
        (Some(billed), Some(rate)) => billed / rate.max(1.0),
        _ => 1.0,
    }
}
