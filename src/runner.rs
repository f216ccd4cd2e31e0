//! Invocation of the external scanner binary.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time;
use tracing::debug;

use crate::error::ScanError;

/// How the external scanner is launched. Built once by the entrypoint and
/// passed in; nothing here lives at process scope.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Scanner binary, `nmap` on PATH by default.
    pub program: String,
    /// Upper bound on one scanner invocation.
    pub timeout: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            program: "nmap".to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Run the scanner against `target` and capture its combined output.
///
/// `advanced` adds service and OS detection flags; it changes only what
/// the scanner is asked to do, never how the output is parsed. A non-zero
/// exit is a scan failure carrying the scanner's own output verbatim;
/// exceeding the configured timeout is reported separately so a slow
/// target reads differently from a broken scan. Once launched, a scan
/// cannot be cancelled, only abandoned at the deadline.
pub async fn run_scan(
    config: &ScannerConfig,
    target: &str,
    advanced: bool,
) -> Result<String, ScanError> {
    let args: &[&str] = if advanced {
        &["-A", "-O", "-Pn"]
    } else {
        &["-Pn"]
    };
    debug!(%target, advanced, program = %config.program, "launching scanner");

    let output_fut = Command::new(&config.program)
        .args(args)
        .arg(target)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match time::timeout(config.timeout, output_fut).await {
        Ok(res) => res?,
        Err(_) => {
            return Err(ScanError::TimedOut {
                target: target.to_string(),
                seconds: config.timeout.as_secs(),
            })
        }
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(ScanError::ScanFailed { output: text });
    }
    Ok(text)
}
