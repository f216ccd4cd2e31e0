//! Set-difference comparison between two finding sequences.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::types::Finding;

/// Findings added and removed between two scans. Derived, never persisted.
///
/// Identity is the full finding content: a changed state or service on the
/// same port shows up as one removal plus one addition, never as an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub added: BTreeSet<Finding>,
    pub removed: BTreeSet<Finding>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compare two finding sequences as sets.
///
/// Duplicates within one sequence collapse; order carries no meaning in
/// the result.
pub fn diff(previous: &[Finding], current: &[Finding]) -> DiffResult {
    let prev: BTreeSet<&Finding> = previous.iter().collect();
    let curr: BTreeSet<&Finding> = current.iter().collect();
    DiffResult {
        added: curr.difference(&prev).map(|f| (*f).clone()).collect(),
        removed: prev.difference(&curr).map(|f| (*f).clone()).collect(),
    }
}
