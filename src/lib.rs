//! Library crate for scan-diff-rs exposing reusable modules.
pub mod advisory;
pub mod diff;
pub mod error;
pub mod ledger;
pub mod parser;
pub mod runner;
pub mod server;
pub mod store;
pub mod types;
pub mod workflow;
