use std::fmt;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::advisory;

/// State of a scanned port, using nmap's vocabulary.
///
/// States we have not seen before are carried verbatim in `Other` so a
/// newer scanner version cannot silently corrupt a record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PortState {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "filtered")]
    Filtered,
    #[serde(rename = "unfiltered")]
    Unfiltered,
    #[serde(rename = "open|filtered")]
    OpenFiltered,
    #[serde(rename = "closed|filtered")]
    ClosedFiltered,
    #[serde(untagged)]
    Other(String),
}

impl PortState {
    pub fn parse(s: &str) -> Self {
        match s {
            "open" => PortState::Open,
            "closed" => PortState::Closed,
            "filtered" => PortState::Filtered,
            "unfiltered" => PortState::Unfiltered,
            "open|filtered" => PortState::OpenFiltered,
            "closed|filtered" => PortState::ClosedFiltered,
            other => PortState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
            PortState::Filtered => write!(f, "filtered"),
            PortState::Unfiltered => write!(f, "unfiltered"),
            PortState::OpenFiltered => write!(f, "open|filtered"),
            PortState::ClosedFiltered => write!(f, "closed|filtered"),
            PortState::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One parsed row of the scanner's port table.
///
/// The advisory note is derived from the port on demand and never stored,
/// so two findings are equal iff their rendered lines are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub port: u16,
    pub protocol: Option<String>,
    pub state: PortState,
    pub service: String,
}

impl Finding {
    /// Static security note for this finding's port.
    pub fn advisory(&self) -> &'static str {
        advisory::advisory_for(self.port, &self.service)
    }

    /// Caller-facing line combining port, state, service and advisory.
    pub fn render(&self) -> String {
        let port = match &self.protocol {
            Some(proto) => format!("{}/{}", self.port, proto),
            None => self.port.to_string(),
        };
        format!(
            "{} is {} and running {}. {}",
            port,
            self.state.to_string().to_uppercase(),
            self.service.to_uppercase(),
            self.advisory()
        )
    }
}

/// One target's findings plus the timestamp they were captured.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: Uuid,
    pub target: String,
    pub time: String,
    pub findings: Vec<Finding>,
}

impl ScanRecord {
    /// Build a record for findings captured now.
    pub fn new(target: impl Into<String>, findings: Vec<Finding>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: target.into(),
            time: timestamp_now(),
            findings,
        }
    }

    /// Rendered lines for every finding, in table order.
    pub fn rendered(&self) -> Vec<String> {
        self.findings.iter().map(Finding::render).collect()
    }
}

/// Current UTC time in the `YYYY-MM-DD HH:MM:SS` layout used throughout
/// the stored history.
pub fn timestamp_now() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}

pub fn format_timestamp(t: OffsetDateTime) -> String {
    let layout = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    t.format(&layout)
        .unwrap_or_else(|_| String::from("1970-01-01 00:00:00"))
}
