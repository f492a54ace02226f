//! Template justifications for flagged claims.
//!
//! The category chooses the shape of the narrative, the claim's fields fill
//! it in. Rendering is pure string formatting.

use crate::feature_extractor::DerivedClaim;
use crate::types::scored::{FraudType, ScoredClaim};

/// Claim fields interpolated into a justification
#[derive(Debug, Clone)]
pub struct JustificationContext<'a> {
    pub hospital_id: &'a str,
    pub patient_id: &'a str,
    pub age: String,
    pub diagnosis: &'a str,
    pub billed_amount: f64,
    pub length_of_stay: i64,
    pub cost_to_package: f64,
    pub patient_claim_count: u32,
    pub risk_score: f64,
    pub cost_ratio_cap: f64,
}

impl<'a> JustificationContext<'a> {
    pub fn new(claim: &'a DerivedClaim, risk_score: f64, cost_ratio_cap: f64) -> Self {
        Self {
            hospital_id: claim.claim.hospital_id.as_deref().unwrap_or("?"),
            patient_id: claim.claim.patient_id.as_deref().unwrap_or("?"),
            age: claim
                .claim
                .age
                .map_or_else(|| "?".to_string(), |age| age.to_string()),
            diagnosis: claim.claim.primary_diagnosis.as_deref().unwrap_or("Unknown"),
            billed_amount: claim.claim.billed_amount.unwrap_or(0.0),
            length_of_stay: claim.features.length_of_stay,
            cost_to_package: claim.features.cost_to_package,
            patient_claim_count: claim.features.patient_claim_count,
            risk_score,
            cost_ratio_cap,
        }
    }
}

impl FraudType {
    /// Render this category's justification
    pub fn justify(self, ctx: &JustificationContext<'_>) -> String {
        match self {
            FraudType::GhostBilling => ghost_billing(ctx),
            FraudType::Upcoding => upcoding(ctx),
            FraudType::FakeAdmission => fake_admission(ctx),
            FraudType::IdentityMisuse => identity_misuse(ctx),
            FraudType::AnomalousPattern => anomalous_pattern(ctx),
        }
    }
}

fn ghost_billing(ctx: &JustificationContext<'_>) -> String {
    format!(
        "GHOST BILLING: Hospital {} billed {} for patient {} (age {}, diagnosis '{}') against a \
         base package rate of ₹0, so no approved procedure backs this claim. A zero package rate \
         is grounds for immediate rejection and review of the hospital's empanelment. Freeze \
         payment and schedule a field verification.",
        ctx.hospital_id,
        format_rupees(ctx.billed_amount),
        ctx.patient_id,
        ctx.age,
        ctx.diagnosis,
    )
}

fn upcoding(ctx: &JustificationContext<'_>) -> String {
    format!(
        "UP-CODING: Billed {} at hospital {} for patient {} (age {}) is {:.1}x the approved \
         package rate for '{}', breaching the {:.1}x regulatory cap and pointing to billing for a \
         costlier procedure than was performed. Risk score {:.2}/1.00. Cross-check procedure \
         records and the discharge summary against the bill.",
        format_rupees(ctx.billed_amount),
        ctx.hospital_id,
        ctx.patient_id,
        ctx.age,
        ctx.cost_to_package,
        ctx.diagnosis,
        ctx.cost_ratio_cap,
        ctx.risk_score,
    )
}

fn fake_admission(ctx: &JustificationContext<'_>) -> String {
    format!(
        "FAKE ADMISSION: Patient {} (age {}) at hospital {} has a length of stay of {} day(s), \
         yet {} was billed for '{}'. The admission appears to exist only on paper. Verify \
         admission and discharge records with the hospital and confirm treatment with the \
         patient.",
        ctx.patient_id,
        ctx.age,
        ctx.hospital_id,
        ctx.length_of_stay,
        format_rupees(ctx.billed_amount),
        ctx.diagnosis,
    )
}

fn identity_misuse(ctx: &JustificationContext<'_>) -> String {
    format!(
        "IDENTITY MISUSE: Patient ID {} (age {}) appears on {} claims in this batch, suggesting \
         one identity is reused for repeated reimbursements. This claim of {} for '{}' at \
         hospital {} is part of a serial billing pattern. Audit every claim under {}, verify the \
         identity linkage and check for overlapping admissions.",
        ctx.patient_id,
        ctx.age,
        ctx.patient_claim_count,
        format_rupees(ctx.billed_amount),
        ctx.diagnosis,
        ctx.hospital_id,
        ctx.patient_id,
    )
}

fn anomalous_pattern(ctx: &JustificationContext<'_>) -> String {
    format!(
        "ANOMALOUS PATTERN: The outlier model flagged patient {} (age {}) at hospital {} with \
         risk score {:.2}/1.00. Billing of {} over a {}-day stay for '{}' deviates significantly \
         from peer claims in this batch. Request itemized billing and clinical notes for review.",
        ctx.patient_id,
        ctx.age,
        ctx.hospital_id,
        ctx.risk_score,
        format_rupees(ctx.billed_amount),
        ctx.length_of_stay,
        ctx.diagnosis,
    )
}

/// Whole-rupee amount with thousands separators, e.g. `₹1,25,000` is
/// written as `₹125,000`
pub fn format_rupees(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}₹{grouped}")
}

/// Optional post-processing that may replace the template text of a
/// flagged claim, e.g. with a reviewer-facing rewrite.
pub trait JustificationEnricher {
    /// Replacement text, or `None` to keep the template
    fn enrich(&self, claim: &ScoredClaim) -> Option<String>;
}
