// ABOUTME: Command implementations driven by the CLI
// ABOUTME: Exports the interactive DDL export command

pub mod export;

pub use export::{export, run_session, ExportSummary, OutputMode};
