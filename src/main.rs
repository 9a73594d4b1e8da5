// ABOUTME: CLI entry point for table-ddl-exporter
// ABOUTME: Parses flags, sets up logging, and runs the interactive export

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use table_ddl_exporter::commands::{self, OutputMode};

/// Long flags that are also accepted with a single leading dash
const SINGLE_DASH_FLAGS: [&str; 3] = ["-config", "-help", "-split"];

#[derive(Parser, Debug)]
#[command(name = "table-ddl-exporter")]
#[command(about = "Export MySQL and PostgreSQL table schemas (DDL) to SQL files")]
#[command(long_about = "Export MySQL and PostgreSQL table schemas (DDL) to SQL files.\n\n\
    Several database profiles can be configured; the tool asks which one to use, \
    lists its tables, and exports all of them or the ones you pick into a commented \
    SQL file.")]
#[command(after_help = "Examples:\n  \
    table-ddl-exporter                    # use ./config.yaml\n  \
    table-ddl-exporter -config db.yaml    # use another config file\n  \
    table-ddl-exporter --split            # one file per table")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    /// Write one file per table instead of a single file
    #[arg(long)]
    split: bool,
}

/// Rewrite `-config`, `-help` and `-split` to their double-dash form
fn normalize_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 {
                return arg;
            }
            match arg.to_str() {
                Some(text) if is_single_dash_flag(text) => OsString::from(format!("-{}", text)),
                _ => arg,
            }
        })
        .collect()
}

fn is_single_dash_flag(arg: &str) -> bool {
    SINGLE_DASH_FLAGS.iter().any(|flag| {
        arg == *flag
            || arg
                .strip_prefix(flag)
                .is_some_and(|rest| rest.starts_with('='))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(normalize_flags(std::env::args_os()));

    // Initialize logging - default to INFO level if RUST_LOG not set
    // Logs go to stderr; stdout carries the prompts
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.split {
        OutputMode::PerTable
    } else {
        OutputMode::Aggregate
    };

    commands::export(&cli.config, mode).await?;
    Ok(())
}
