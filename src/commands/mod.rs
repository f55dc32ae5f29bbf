//! Command implementations
//!
//! Each module corresponds to an action exposed by the CLI.

pub mod export;

pub use export::{export_with, run as export_run, ExportSummary};
