//! Synthetic Claim Generator
//!
//! Writes a reproducible batch of claims as JSON lines, with a share of them
//! carrying the fraud patterns the pipeline is meant to catch.

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use claim_fraud_pipeline::{config::LoggingConfig, logging::init_logging, ClaimRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "claim-generator", about = "Generate synthetic insurance claims")]
struct Args {
    /// Number of claims
    #[arg(long, short = 'n', default_value_t = 500)]
    count: usize,

    #[arg(long, default_value_t = 12)]
    hospitals: usize,

    #[arg(long, default_value_t = 400)]
    patients: usize,

    /// Share of claims carrying an injected fraud pattern
    #[arg(long, default_value_t = 0.1)]
    fraud_rate: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

const DIAGNOSES: [(&str, f64); 6] = [
    ("Cataract", 25_000.0),
    ("Appendectomy", 40_000.0),
    ("Maternity Care", 30_000.0),
    ("Knee Replacement", 150_000.0),
    ("Dialysis", 15_000.0),
    ("Angioplasty", 120_000.0),
];

#[derive(Debug, Clone, Copy)]
enum Pattern {
    ZeroPackageRate,
    InflatedBilling,
    SameDayDischarge,
    RepeatedPatient,
    MaleMaternity,
}

const PATTERNS: [Pattern; 5] = [
    Pattern::ZeroPackageRate,
    Pattern::InflatedBilling,
    Pattern::SameDayDischarge,
    Pattern::RepeatedPatient,
    Pattern::MaleMaternity,
];

/// Claim generator for testing
struct ClaimGenerator {
    rng: StdRng,
    hospitals: usize,
    patients: usize,
    counter: u64,
    epoch: NaiveDateTime,
    /// Patient reused by every repeated-identity claim
    repeat_patient: String,
}

impl ClaimGenerator {
    fn new(seed: u64, hospitals: usize, patients: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let repeat_patient = format!("PAT-{:05}", rng.gen_range(0..patients.max(1)));
        Self {
            rng,
            hospitals: hospitals.max(1),
            patients: patients.max(1),
            counter: 0,
            epoch: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            repeat_patient,
        }
    }

    /// Generate a plausible legitimate claim
    fn generate_legitimate(&mut self) -> ClaimRecord {
        self.counter += 1;
        let (diagnosis, package_rate) = DIAGNOSES[self.rng.gen_range(0..DIAGNOSES.len())];
        let gender = if diagnosis == "Maternity Care" || self.rng.gen_bool(0.5) {
            "Female"
        } else {
            "Male"
        };

        let requested = self.epoch + Duration::hours(self.rng.gen_range(0..24 * 300));
        let approved = requested + Duration::hours(self.rng.gen_range(2..72));
        let admitted = approved + Duration::hours(self.rng.gen_range(1..48));
        let discharged = admitted + Duration::days(self.rng.gen_range(1..8));

        ClaimRecord::new(format!("TXN-{:06}", self.counter))
            .with_patient(format!("PAT-{:05}", self.rng.gen_range(0..self.patients)))
            .with_hospital(format!("HOSP-{:03}", self.rng.gen_range(0..self.hospitals)))
            .with_demographics(self.rng.gen_range(18..85), gender)
            .with_diagnosis(diagnosis)
            .with_billing(package_rate * self.rng.gen_range(0.85..1.4), package_rate)
            .with_preauth(requested, approved)
            .with_stay(admitted, discharged)
    }

    /// Generate a claim carrying one injected fraud pattern
    fn generate_suspicious(&mut self) -> (Pattern, ClaimRecord) {
        let pattern = PATTERNS[self.rng.gen_range(0..PATTERNS.len())];
        let mut claim = self.generate_legitimate();

        match pattern {
            Pattern::ZeroPackageRate => {
                claim.base_package_rate = Some(0.0);
            }
            Pattern::InflatedBilling => {
                let rate = claim.base_package_rate.unwrap_or(20_000.0);
                claim.billed_amount = Some(rate * self.rng.gen_range(2.6..5.0));
            }
            Pattern::SameDayDischarge => {
                claim.discharged_at = claim.admitted_at;
            }
            Pattern::RepeatedPatient => {
                claim.patient_id = Some(self.repeat_patient.clone());
            }
            Pattern::MaleMaternity => {
                claim.gender = Some("Male".to_string());
                claim.primary_diagnosis = Some("Maternity Care".to_string());
            }
        }

        (pattern, claim)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&LoggingConfig::default(), "claim_generator")?;

    info!(
        count = args.count,
        hospitals = args.hospitals,
        patients = args.patients,
        fraud_rate = args.fraud_rate,
        seed = args.seed,
        "Generating claims"
    );

    let fraud_rate = args.fraud_rate.clamp(0.0, 1.0);
    let mut generator = ClaimGenerator::new(args.seed, args.hospitals, args.patients);
    let mut sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for _ in 0..args.count {
        let claim = if generator.rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            let (pattern, claim) = generator.generate_suspicious();
            debug!(transaction_id = ?claim.transaction_id, ?pattern, "Injected fraud pattern");
            claim
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        serde_json::to_writer(&mut sink, &claim)?;
        sink.write_all(b"\n")?;
    }
    sink.flush()?;

    info!(
        "Completed! Generated {} claims ({} legitimate, {} suspicious)",
        args.count, legitimate_count, suspicious_count
    );

    Ok(())
}
