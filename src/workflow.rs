//! The scan-and-compare workflow tying parser, store, diff and ledger
//! together: parse the raw output, diff against the stored history,
//! persist the new record, remember it in the session ledger.

use tracing::{info, warn};

use crate::diff;
use crate::error::ScanError;
use crate::ledger::SessionLedger;
use crate::parser;
use crate::store::HistoryStore;
use crate::types::ScanRecord;

/// Line emitted when a scan-time comparison found no differences.
pub const NO_CHANGES: &str = "No changes since last scan.";

/// One annotated difference against the previous scan of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    New(String),
    Removed(String),
}

impl Change {
    pub fn render(&self) -> String {
        match self {
            Change::New(line) => format!("New: {line}"),
            Change::Removed(line) => format!("Removed: {line}"),
        }
    }
}

/// Comparison of the current scan with the stored previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Timestamp of the previous scan the diff was taken against.
    pub previous_time: String,
    /// Empty means nothing changed.
    pub changes: Vec<Change>,
}

impl Comparison {
    /// Renderable comparison block. Emits the no-change sentinel itself:
    /// this comparison is produced synchronously with the scan and has no
    /// separate rendering step that could add it later.
    pub fn lines(&self) -> Vec<String> {
        let mut out = vec![format!("Comparison with last scan on {}:", self.previous_time)];
        if self.changes.is_empty() {
            out.push(NO_CHANGES.to_string());
        } else {
            out.extend(self.changes.iter().map(Change::render));
        }
        out
    }
}

/// Everything one scan produced: the new record, the optional comparison
/// with the stored history, and how many table rows the parser skipped.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub record: ScanRecord,
    /// `None` when the target had no stored history. Nothing to compare
    /// is a distinct state, not an empty diff.
    pub comparison: Option<Comparison>,
    pub skipped_rows: usize,
}

impl ScanReport {
    /// Flatten the report into the caller-facing message list.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(cmp) = &self.comparison {
            out.extend(cmp.lines());
        }
        out.push(format!("Current scan at {}:", self.record.time));
        if self.record.findings.is_empty() {
            out.push("No findings reported by the scanner.".to_string());
        } else {
            out.extend(self.record.rendered());
        }
        if self.skipped_rows > 0 {
            out.push(format!(
                "Skipped {} malformed row(s) in scanner output.",
                self.skipped_rows
            ));
        }
        out
    }
}

/// Run the full workflow for one scan of `target` given the scanner's raw
/// output.
///
/// Steps run sequentially and synchronously. The store's read-modify-write
/// is only safe because the caller holds the store exclusively for the
/// duration; two interleaved invocations for the same target would race on
/// the comparison baseline.
pub fn scan_and_compare(
    store: &mut HistoryStore,
    ledger: &mut SessionLedger,
    target: &str,
    raw_output: &str,
) -> Result<ScanReport, ScanError> {
    if target.trim().is_empty() {
        return Err(ScanError::EmptyTarget);
    }

    let parsed = parser::parse_nmap_output(raw_output);
    if parsed.skipped_rows > 0 {
        warn!(
            target,
            skipped = parsed.skipped_rows,
            "malformed rows skipped in scanner output"
        );
    }

    let record = ScanRecord::new(target, parsed.findings);

    let comparison = store.get(target).map(|previous| {
        let d = diff::diff(&previous.results, &record.findings);
        let mut changes: Vec<Change> =
            d.added.iter().map(|f| Change::New(f.render())).collect();
        changes.extend(d.removed.iter().map(|f| Change::Removed(f.render())));
        Comparison {
            previous_time: previous.time.clone(),
            changes,
        }
    });

    store.put(&record)?;
    ledger.push(record.clone());

    info!(
        target,
        findings = record.findings.len(),
        compared = comparison.is_some(),
        "scan recorded"
    );

    Ok(ScanReport {
        record,
        comparison,
        skipped_rows: parsed.skipped_rows,
    })
}
