use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use scan_diff_rs::ledger::SessionLedger;
use scan_diff_rs::runner::{self, ScannerConfig};
use scan_diff_rs::server::{self, AppState};
use scan_diff_rs::store::HistoryStore;
use scan_diff_rs::workflow;

/// scan-diff-rs — nmap output parser and scan history diff engine with a tiny embedded web UI.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scan-diff-rs",
    version,
    about = "Nmap output parser and scan history diff engine with a tiny embedded web UI.",
    long_about = None
)]
struct Cli {
    /// Bind address for the embedded web UI.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Path to the scan history document.
    #[arg(long, default_value = "scan_history.json")]
    history: PathBuf,

    /// Scanner binary to invoke.
    #[arg(long, default_value = "nmap")]
    scanner: String,

    /// Per-scan timeout in seconds.
    #[arg(long = "timeout-secs", default_value_t = 300)]
    timeout_secs: u64,

    /// Scan this target once from the command line and exit.
    #[arg(long)]
    target: Option<String>,

    /// Use the advanced scanner invocation (-A -O) with --target.
    #[arg(long, default_value_t = false)]
    advanced: bool,

    /// Start the embedded HTTP UI server.
    #[arg(long = "serve-ui", default_value_t = false)]
    serve_ui: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("scan-diff-rs configuration:");
    println!("  history      : {}", cli.history.display());
    println!("  scanner      : {}", cli.scanner);
    println!("  timeout_secs : {}", cli.timeout_secs);
    println!(
        "  target       : {}",
        cli.target.as_deref().unwrap_or("<none>")
    );
    println!("  serve_ui     : {}", cli.serve_ui);

    let config = ScannerConfig {
        program: cli.scanner.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
    };

    if let Some(target) = cli.target.as_deref() {
        scan_once(&cli, &config, target).await;
    }

    if cli.serve_ui {
        let state = AppState::new(HistoryStore::open(&cli.history), config);
        println!("Serving UI on http://{}", cli.bind);
        server::spawn_server(&cli.bind, state).await?;
    } else if cli.target.is_none() {
        println!("Nothing to do. Pass --target <host> or --serve-ui.");
    }

    Ok(())
}

/// One-shot CLI mode: scan, print the report lines, exit. Failures print a
/// message and leave the exit code alone, same as a failed scan in the UI.
async fn scan_once(cli: &Cli, config: &ScannerConfig, target: &str) {
    let mut store = HistoryStore::open(&cli.history);
    let mut ledger = SessionLedger::new();

    match runner::run_scan(config, target, cli.advanced).await {
        Ok(raw) => match workflow::scan_and_compare(&mut store, &mut ledger, target, &raw) {
            Ok(report) => {
                for line in report.lines() {
                    println!("{line}");
                }
            }
            Err(e) => eprintln!("{}", e.to_message()),
        },
        Err(e) => eprintln!("{}", e.to_message()),
    }
}
