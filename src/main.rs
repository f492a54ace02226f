//! Claim Fraud Pipeline - Main Entry Point
//!
//! Loads a claim batch, scores it, writes the scored records as JSON lines
//! and logs a summary plus the flagged-claim report.

use anyhow::{Context, Result};
use claim_fraud_pipeline::{
    config::AppConfig, logging::init_logging, reader::load_claims, writer::ScoredClaimWriter,
    ScoringPipeline,
};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "claim-fraud-pipeline", about = "Score a batch of insurance claims for fraud")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "config/config.toml")]
    config: PathBuf,

    /// Claims as a JSON array or JSON lines
    #[arg(long, short)]
    input: PathBuf,

    /// Where to write scored claims (JSON lines)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Override the expected outlier fraction
    #[arg(long)]
    contamination: Option<f64>,

    /// Override the number of isolation trees
    #[arg(long)]
    n_estimators: Option<usize>,

    /// Override the forest seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Missing file means defaults plus env overrides; a broken file is fatal
    let config_missing = !args.config.exists();
    let mut config = AppConfig::load_from_path(&args.config)?;

    if let Some(contamination) = args.contamination {
        config.detection.contamination = contamination;
    }
    if let Some(n_estimators) = args.n_estimators {
        config.detection.n_estimators = n_estimators;
    }
    if let Some(seed) = args.seed {
        config.detection.random_seed = seed;
    }
    config.validate()?;

    init_logging(&config.logging, "claim_fraud_pipeline")?;

    info!("Starting Claim Fraud Pipeline");
    if config_missing {
        warn!(
            path = %args.config.display(),
            "Config file not found, using defaults and CLAIMS_* overrides"
        );
    }
    info!(
        "Isolation forest: contamination={:.2}, trees={}, max_samples={}, seed={}",
        config.detection.contamination,
        config.detection.n_estimators,
        config.detection.max_samples,
        config.detection.random_seed
    );

    let claims = load_claims(&args.input)?;
    info!(path = %args.input.display(), claims = claims.len(), "Claims loaded");

    let pipeline = ScoringPipeline::new(&config);
    let batch = match pipeline.score_batch(claims) {
        Ok(batch) => batch,
        Err(e) => {
            error!(error = %e, "Scoring failed");
            return Err(e.into());
        }
    };

    if let Some(path) = &args.output {
        let mut writer = ScoredClaimWriter::new(BufWriter::new(File::create(path)?));
        let written = writer
            .write_batch(batch.records())
            .with_context(|| format!("Failed to write scored claims to {}", path.display()))?;
        writer.finish()?;
        info!(path = %path.display(), records = written, "Scored claims written");
    }

    batch.summary().print_summary(batch.timings());

    for record in batch.flagged() {
        warn!(
            transaction_id = record.claim.transaction_id.as_deref().unwrap_or("?"),
            hospital_id = record.claim.hospital_id.as_deref().unwrap_or("?"),
            risk_score = record.risk_score,
            fraud_type = record.fraud_type.map(|t| t.label()).unwrap_or("-"),
            review_status = record.review_status.label(),
            "{}",
            record.justification
        );
    }

    info!("Pipeline finished");
    Ok(())
}
