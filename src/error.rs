use thiserror::Error;

/// Failures surfaced by the scan workflow.
///
/// Everything here is converted into a renderable message at the request
/// boundary; no variant aborts the service.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("No target specified.")]
    EmptyTarget,

    /// The scanner ran but exited non-zero; carries its own output verbatim.
    #[error("Scan failed: {output}")]
    ScanFailed { output: String },

    /// The scanner exceeded its configured deadline. Distinct from
    /// `ScanFailed` so a slow target reads differently from a broken scan.
    #[error("Scan of {target} timed out after {seconds}s")]
    TimedOut { target: String, seconds: u64 },

    #[error("Failed to run scanner: {0}")]
    Spawn(#[from] std::io::Error),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ScanError {
    /// Caller-facing message for this failure. Unexpected faults get a
    /// generic prefix with the cause appended for diagnosis.
    pub fn to_message(&self) -> String {
        match self {
            ScanError::EmptyTarget
            | ScanError::ScanFailed { .. }
            | ScanError::TimedOut { .. } => self.to_string(),
            ScanError::Spawn(e) => format!("Unexpected error: {e}"),
            ScanError::Unexpected(e) => format!("Unexpected error: {e:#}"),
        }
    }
}
