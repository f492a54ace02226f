//! JSON-lines output for scored claims

use crate::types::scored::ScoredClaim;
use anyhow::{Context, Result};
use std::io::Write;
use tracing::{debug, error};

/// Writes one scored claim per line to any [`Write`] sink
pub struct ScoredClaimWriter<W: Write> {
    sink: W,
    written: usize,
}

impl<W: Write> ScoredClaimWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    /// Write a scored claim
    pub fn write(&mut self, record: &ScoredClaim) -> Result<()> {
        serde_json::to_writer(&mut self.sink, record).context("Failed to serialize scored claim")?;
        self.sink.write_all(b"\n")?;
        self.written += 1;

        debug!(
            transaction_id = record.claim.transaction_id.as_deref().unwrap_or("?"),
            risk_score = record.risk_score,
            "Wrote scored claim"
        );

        Ok(())
    }

    /// Write multiple records, stopping at the first failure. Returns the
    /// number written.
    pub fn write_batch(&mut self, records: &[ScoredClaim]) -> Result<usize> {
        for record in records {
            if let Err(e) = self.write(record) {
                error!(
                    transaction_id = record.claim.transaction_id.as_deref().unwrap_or("?"),
                    written = self.written,
                    error = %e,
                    "Failed to write scored claim"
                );
                return Err(e);
            }
        }
        Ok(records.len())
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the sink
    pub fn finish(mut self) -> Result<W> {
        self.sink.flush().context("Failed to flush scored claims")?;
        Ok(self.sink)
    }
}
