//! Failure reporting: one human-readable report per collection, and one
//! machine-readable summary per phase at the storage root.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{write_atomic, StoreError};

const REPORT_FILE: &str = "report.txt";
const PHASE_REPORT_FILE: &str = "phase_report.json";

/// How many messages of each category the human-readable report spells
/// out; the rest are only counted.
const MESSAGES_PER_CATEGORY: usize = 3;

/// Failures of one collection during a phase, grouped by category.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    categories: BTreeMap<String, Vec<String>>,
}

impl CollectionReport {
    pub fn record(&mut self, category: &str, message: impl Into<String>) {
        self.categories.entry(category.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn total(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Writes `stac/report.txt` under the collection directory, or removes
    /// a stale one when this run had no failures.
    pub fn write(&self, stac_dir: &Path) -> Result<(), StoreError> {
        let path = stac_dir.join(REPORT_FILE);
        if self.is_empty() {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(&path, e)),
            }
            return Ok(());
        }

        let mut out = String::new();
        for (category, messages) in &self.categories {
            writeln!(out, "{category}: {} failure(s)", messages.len()).ok();
            for message in messages.iter().take(MESSAGES_PER_CATEGORY) {
                writeln!(out, "  - {message}").ok();
            }
            if messages.len() > MESSAGES_PER_CATEGORY {
                writeln!(out, "  … and {} more", messages.len() - MESSAGES_PER_CATEGORY)
                    .ok();
            }
        }
        write_atomic(&path, out.as_bytes())
    }
}

/// The machine-readable summary of one phase run, written at the storage
/// root.
#[derive(Debug, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub phase: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Per-collection outcome, keyed by fingerprint.
    pub collections: BTreeMap<String, CollectionOutcome>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CollectionOutcome {
    pub ok: bool,
    pub failures: usize,
}

impl PhaseSummary {
    pub fn new(phase: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            phase: phase.to_string(),
            started_at,
            finished_at: started_at,
            collections: BTreeMap::new(),
        }
    }

    pub fn outcome(&mut self, fingerprint: String, report: &CollectionReport) {
        self.collections.insert(
            fingerprint,
            CollectionOutcome { ok: report.is_empty(), failures: report.total() },
        );
    }

    pub fn write(mut self, root: &Path, finished_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.finished_at = finished_at;
        let bytes = serde_json::to_vec_pretty(&self)?;
        write_atomic(&root.join(PHASE_REPORT_FILE), &bytes)
    }
}
