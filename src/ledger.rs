//! Per-session record of the last two scans.

use serde::{Deserialize, Serialize};

use crate::diff::{self, DiffResult};
use crate::types::ScanRecord;

/// How many scans a session remembers.
pub const LEDGER_CAPACITY: usize = 2;

/// Bounded history of the most recent scans in one caller session.
///
/// Independent of the durable store, so two ad-hoc scans can be compared
/// even across different targets. The transport that scopes a session
/// (cookie, header, whatever) is the caller's business; the ledger only
/// sees appends and reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionLedger {
    records: Vec<ScanRecord>,
}

/// The two scans a session comparison was computed from, plus their diff.
#[derive(Debug, Clone)]
pub struct SessionComparison {
    pub older: ScanRecord,
    pub newer: ScanRecord,
    pub diff: DiffResult,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scan, evicting the oldest once the capacity is exceeded.
    pub fn push(&mut self, record: ScanRecord) {
        self.records.push(record);
        if self.records.len() > LEDGER_CAPACITY {
            let excess = self.records.len() - LEDGER_CAPACITY;
            self.records.drain(..excess);
        }
    }

    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Diff the two most recent scans, oldest as the baseline.
    ///
    /// `None` means fewer than two scans exist; callers must report that
    /// distinctly from an empty diff, which here is a perfectly valid
    /// "nothing changed" outcome.
    pub fn compare_last_two(&self) -> Option<SessionComparison> {
        if self.records.len() < 2 {
            return None;
        }
        let older = &self.records[self.records.len() - 2];
        let newer = &self.records[self.records.len() - 1];
        Some(SessionComparison {
            older: older.clone(),
            newer: newer.clone(),
            diff: diff::diff(&older.findings, &newer.findings),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(target: &str) -> ScanRecord {
        ScanRecord::new(target, vec![])
    }

    #[test]
    fn retains_only_last_two() {
        let mut ledger = SessionLedger::new();
        ledger.push(record("a"));
        ledger.push(record("b"));
        ledger.push(record("c"));
        assert_eq!(ledger.len(), 2);
        let targets: Vec<&str> = ledger.records().iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["b", "c"]);
    }

    #[test]
    fn single_record_is_insufficient() {
        let mut ledger = SessionLedger::new();
        ledger.push(record("a"));
        assert!(ledger.compare_last_two().is_none());
    }

    #[test]
    fn compares_most_recent_pair() {
        let mut ledger = SessionLedger::new();
        ledger.push(record("a"));
        ledger.push(record("b"));
        ledger.push(record("c"));
        let cmp = ledger.compare_last_two().unwrap();
        assert_eq!(cmp.older.target, "b");
        assert_eq!(cmp.newer.target, "c");
        assert!(cmp.diff.is_empty());
    }
}
