//! Append-only audit trail in JSONL form

use crate::types::{AuditKind, AuditRecord};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file and its directory on first use
    pub fn append(&self, record: &AuditRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        debug!("Audit record written to {}", self.path.display());
        Ok(())
    }

    /// All readable records, oldest first. Corrupt lines are skipped.
    pub fn read_all(&self) -> std::io::Result<Vec<AuditRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping audit line {}: {}", lineno + 1, e),
            }
        }
        Ok(records)
    }

    /// The newest `n` records, newest last
    pub fn tail(&self, n: usize) -> std::io::Result<Vec<AuditRecord>> {
        let mut records = self.read_all()?;
        let skip = records.len().saturating_sub(n);
        Ok(records.split_off(skip))
    }

    pub fn stats(&self) -> std::io::Result<AuditStats> {
        Ok(AuditStats::from_records(&self.read_all()?))
    }
}

/// Aggregate counts over the audit trail
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AuditStats {
    pub total: usize,
    pub categories: usize,
    pub correlations: usize,
    pub incidents: usize,
    pub degraded: usize,
    pub fallbacks: usize,
    pub with_absorbed_errors: usize,
}

impl AuditStats {
    pub fn from_records(records: &[AuditRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.kind {
                AuditKind::Category => stats.categories += 1,
                AuditKind::Correlation => stats.correlations += 1,
                AuditKind::Incident => stats.incidents += 1,
            }
            if !record.structured && record.raw_response.is_some() {
                stats.degraded += 1;
            }
            if record.origin == Some(sightline_core::ResultOrigin::Fallback) {
                stats.fallbacks += 1;
            }
            if !record.absorbed_errors.is_empty() {
                stats.with_absorbed_errors += 1;
            }
        }
        stats
    }
}
