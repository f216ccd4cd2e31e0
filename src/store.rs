//! Durable per-target scan history, one JSON document on disk.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Finding, ScanRecord};

/// The most recent findings for one target, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredScan {
    pub results: Vec<Finding>,
    pub time: String,
}

/// Maps each target to its most recent scan.
///
/// Every `put` rewrites the whole document. Fine for an operator tool
/// with a handful of targets; not safe for concurrent writers, so the
/// server holds the store exclusively for each scan.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: HashMap<String, StoredScan>,
}

impl HistoryStore {
    /// Open the store backed by the document at `path`.
    ///
    /// A missing or unreadable document starts an empty store so a first
    /// run needs no prior state; corruption is logged, never fatal.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "scan history unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    /// Most recent scan of `target`, if it has ever been scanned.
    pub fn get(&self, target: &str) -> Option<&StoredScan> {
        self.entries.get(target)
    }

    /// Record `record` as the most recent scan of its target, replacing
    /// any earlier entry, and rewrite the backing document.
    ///
    /// The in-memory map is only updated once the document is on disk, so
    /// a failed write cannot leave a comparison baseline that was never
    /// persisted.
    pub fn put(&mut self, record: &ScanRecord) -> Result<()> {
        let mut candidate = self.entries.clone();
        candidate.insert(
            record.target.clone(),
            StoredScan {
                results: record.findings.clone(),
                time: record.time.clone(),
            },
        );
        let json = serde_json::to_string_pretty(&candidate)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write scan history to {}", self.path.display()))?;
        self.entries = candidate;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
