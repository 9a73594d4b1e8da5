// ABOUTME: Export command: select a profile, pick tables, fetch DDL, write files
// ABOUTME: Per-table failures are skipped; connection is closed on every exit path

use crate::config::load_config;
use crate::connection::{DatabaseConnection, SchemaSource};
use crate::error;
use crate::interactive::Selector;
use crate::utils::sanitize_identifier;
use crate::writer::{ExportResult, PartialWrite, SchemaWriter};
use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// How exported DDL is laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One file with every table
    #[default]
    Aggregate,
    /// One file per table
    PerTable,
}

/// Outcome of one export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of tables the user selected
    pub total: usize,
    /// Tables whose DDL was fetched
    pub succeeded: usize,
    /// Tables whose DDL could not be fetched, with the reason
    pub failed: Vec<(String, String)>,
    /// Files written
    pub written: Vec<PathBuf>,
    /// Set when the output could not be written
    pub write_error: Option<String>,
}

/// Export table DDL interactively using the profiles in `config_path`
///
/// Steps:
/// 1. Load the configuration and reject an empty profile list
/// 2. Ask the user for a profile on stdin
/// 3. Connect to the chosen database
/// 4. Run the table selection, DDL fetch and write ([`run_session`])
/// 5. Close the connection, whatever the outcome of step 4
///
/// # Errors
///
/// This function will return an error if:
/// - The configuration file is unreadable, malformed, or has no profiles
/// - Standard input is closed before a selection is made
/// - The profile's database type is unsupported or the connection fails
/// - Table listing fails
/// - The user declines the confirmation prompt
///
/// Failures fetching a single table's DDL or writing the output are reported
/// in the returned [`ExportSummary`] instead.
pub async fn export(config_path: &Path, mode: OutputMode) -> Result<ExportSummary> {
    let config = load_config(config_path).context("Failed to load configuration")?;
    if config.databases.is_empty() {
        bail!(
            "No database profiles found in configuration file {}",
            config_path.display()
        );
    }
    tracing::info!(
        "Loaded {} database profile(s) from {}",
        config.databases.len(),
        config_path.display()
    );

    let stdin = io::stdin();
    let mut selector = Selector::new(stdin.lock(), io::stdout());

    let profile = selector
        .select_database(&config.databases)
        .context("Failed to select database")?;

    selector.say(&format!("\nConnecting to database: {}", profile.name))?;
    let mut connection = DatabaseConnection::connect(profile)
        .await
        .context(format!("Failed to connect to database '{}'", profile.name))?;

    let writer = SchemaWriter::new(config.output.clone());
    let outcome = async {
        selector.say("Database connection established")?;
        run_session(&mut connection, &profile.database, &mut selector, &writer, mode).await
    }
    .await;

    connection.close().await;

    let summary = outcome.context("Export aborted")?;
    Ok(summary)
}

/// Select tables from `source`, fetch their DDL and write it with `writer`
///
/// Progress, per-table failures and the final summary are printed through
/// the selector's output stream.
///
/// # Errors
///
/// Returns an error if table listing fails, the user cancels, input ends, or
/// the selector cannot print. Tables whose DDL cannot be fetched and output
/// that cannot be written are recorded in the [`ExportSummary`] instead.
pub async fn run_session<S, R, W>(
    source: &mut S,
    database: &str,
    selector: &mut Selector<R, W>,
    writer: &SchemaWriter,
    mode: OutputMode,
) -> error::Result<ExportSummary>
where
    S: SchemaSource + ?Sized,
    R: BufRead,
    W: Write,
{
    selector.say("Fetching table list...")?;
    let all_tables = source.list_tables().await?;
    tracing::info!("✓ Found {} table(s) in '{}'", all_tables.len(), database);

    if all_tables.is_empty() {
        selector.say("No tables found in the database")?;
        return Ok(ExportSummary::default());
    }

    let selected = selector.select_tables(&all_tables)?;
    selector.say(&format!(
        "\nExporting DDL for {} table(s)...",
        selected.len()
    ))?;

    let mut summary = ExportSummary {
        total: selected.len(),
        ..ExportSummary::default()
    };
    let mut tables_ddl = ExportResult::new();

    for (i, table) in selected.iter().enumerate() {
        selector.say(&format!(
            "Exporting [{}/{}]: {}",
            i + 1,
            selected.len(),
            sanitize_identifier(table)
        ))?;

        match source.table_ddl(table).await {
            Ok(ddl) => {
                tables_ddl.insert(table.clone(), ddl);
            }
            Err(e) => {
                let reason = format!("{:#}", anyhow::Error::from(e));
                tracing::warn!("⚠ Skipping table '{}': {}", sanitize_identifier(table), reason);
                selector.say(&format!(
                    "Error: failed to fetch DDL for {}: {}",
                    sanitize_identifier(table),
                    reason
                ))?;
                summary.failed.push((table.clone(), reason));
            }
        }
    }
    summary.succeeded = tables_ddl.len();

    if !tables_ddl.is_empty() {
        let written = match mode {
            OutputMode::Aggregate => writer
                .write_all(database, &tables_ddl)
                .map(|path| vec![path])
                .map_err(PartialWrite::from),
            OutputMode::PerTable => writer.write_per_table(database, &tables_ddl),
        };

        match written {
            Ok(paths) => {
                for path in &paths {
                    selector.say(&format!("Saved: {}", path.display()))?;
                }
                selector.say(&format!(
                    "Saved DDL for {} table(s)",
                    summary.succeeded
                ))?;
                summary.written = paths;
            }
            Err(PartialWrite { written, source }) => {
                for path in &written {
                    selector.say(&format!("Saved: {}", path.display()))?;
                }
                let reason = format!("{:#}", anyhow::Error::from(source));
                tracing::error!("Failed to save DDL: {}", reason);
                selector.say(&format!("Error: failed to save DDL: {}", reason))?;
                summary.written = written;
                summary.write_error = Some(reason);
            }
        }
    }

    print_summary(selector, &summary, writer.output_directory())?;
    Ok(summary)
}

fn print_summary<R: BufRead, W: Write>(
    selector: &mut Selector<R, W>,
    summary: &ExportSummary,
    output_directory: &Path,
) -> error::Result<()> {
    selector.say("\n=== Export complete ===")?;
    selector.say(&format!(
        "Exported: {}/{} table(s)",
        summary.succeeded, summary.total
    ))?;
    selector.say(&format!("Output directory: {}", output_directory.display()))?;

    if summary.succeeded < summary.total {
        selector.say(&format!(
            "Failed: {} table(s) could not be exported",
            summary.total - summary.succeeded
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputSpec;
    use crate::error::ExportError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io::Cursor;
    use tempfile::tempdir;

    /// In-memory schema source; tables missing from `ddl` fail to export
    struct FakeSource {
        tables: Vec<String>,
        ddl: HashMap<String, String>,
    }

    impl FakeSource {
        fn new(tables: &[&str], failing: &[&str]) -> Self {
            let ddl = tables
                .iter()
                .filter(|t| !failing.contains(t))
                .map(|t| (t.to_string(), format!("CREATE TABLE {} (id int);", t)))
                .collect();
            Self {
                tables: tables.iter().map(|t| t.to_string()).collect(),
                ddl,
            }
        }
    }

    #[async_trait]
    impl SchemaSource for FakeSource {
        async fn list_tables(&mut self) -> error::Result<Vec<String>> {
            Ok(self.tables.clone())
        }

        async fn table_ddl(&mut self, table: &str) -> error::Result<String> {
            self.ddl.get(table).cloned().ok_or_else(|| ExportError::Query {
                context: format!("table '{}' is broken", table),
                source: None,
            })
        }
    }

    fn selector(input: &str) -> Selector<Cursor<Vec<u8>>, Vec<u8>> {
        Selector::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn writer(dir: &Path) -> SchemaWriter {
        SchemaWriter::new(OutputSpec {
            directory: dir.to_string_lossy().into_owned(),
            filename_format: "{database}_schema".to_string(),
        })
    }

    #[tokio::test]
    async fn test_selected_tables_are_written_sorted() {
        let dir = tempdir().unwrap();
        let mut source = FakeSource::new(&["zeta", "alpha", "mid"], &[]);
        let mut sel = selector("zeta,alpha,mid\ny\n");

        let summary = run_session(
            &mut source,
            "shop",
            &mut sel,
            &writer(dir.path()),
            OutputMode::Aggregate,
        )
        .await
        .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.written, vec![dir.path().join("shop_schema.sql")]);

        let content = std::fs::read_to_string(&summary.written[0]).unwrap();
        let alpha = content.find("-- Table: alpha").unwrap();
        let mid = content.find("-- Table: mid").unwrap();
        let zeta = content.find("-- Table: zeta").unwrap();
        assert!(alpha < mid && mid < zeta);

        let output = String::from_utf8(sel.into_output()).unwrap();
        assert!(output.contains("Exporting [1/3]: zeta"));
        assert!(output.contains("Exported: 3/3 table(s)"));
    }

    #[tokio::test]
    async fn test_failed_tables_are_skipped_and_counted() {
        let dir = tempdir().unwrap();
        let mut source = FakeSource::new(&["users", "orders", "audit"], &["orders"]);
        let mut sel = selector("0\n");

        let summary = run_session(
            &mut source,
            "shop",
            &mut sel,
            &writer(dir.path()),
            OutputMode::Aggregate,
        )
        .await
        .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(
            summary.failed[0],
            ("orders".to_string(), "Query failed: table 'orders' is broken".to_string())
        );

        let content = std::fs::read_to_string(&summary.written[0]).unwrap();
        assert!(content.contains("-- Tables: 2"));
        assert!(!content.contains("CREATE TABLE orders"));

        let output = String::from_utf8(sel.into_output()).unwrap();
        assert!(output.contains("Error: failed to fetch DDL for orders"));
        assert!(output.contains("Failed: 1 table(s) could not be exported"));
    }

    #[tokio::test]
    async fn test_cancellation_writes_nothing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let mut source = FakeSource::new(&["users", "orders"], &[]);

        for answer in ["n", "", "maybe"] {
            let mut sel = selector(&format!("1,2\n{}\n", answer));
            let result =
                run_session(&mut source, "shop", &mut sel, &writer(&out), OutputMode::Aggregate)
                    .await;

            assert!(matches!(result, Err(ExportError::UserCancelled)));
            assert!(!out.exists());
        }
    }

    #[tokio::test]
    async fn test_no_tables_skips_prompt() {
        let dir = tempdir().unwrap();
        let mut source = FakeSource::new(&[], &[]);
        let mut sel = selector("");

        let summary = run_session(
            &mut source,
            "shop",
            &mut sel,
            &writer(dir.path()),
            OutputMode::Aggregate,
        )
        .await
        .unwrap();

        assert_eq!(summary, ExportSummary::default());
    }

    #[tokio::test]
    async fn test_all_failures_write_no_file() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let mut source = FakeSource::new(&["users"], &["users"]);
        let mut sel = selector("0\n");

        let summary = run_session(&mut source, "shop", &mut sel, &writer(&out), OutputMode::Aggregate)
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 0);
        assert!(summary.written.is_empty());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_write_failure_still_returns_summary() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file in the way").unwrap();

        let mut source = FakeSource::new(&["users"], &[]);
        let mut sel = selector("0\n");

        let summary = run_session(
            &mut source,
            "shop",
            &mut sel,
            &writer(&blocker),
            OutputMode::Aggregate,
        )
        .await
        .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert!(summary.written.is_empty());

        // The reason carries the whole error chain, down to the OS error
        let reason = summary.write_error.unwrap();
        assert!(reason.starts_with("I/O operation failed: failed to create output directory"));
        assert!(reason.matches(": ").count() >= 2);

        let output = String::from_utf8(sel.into_output()).unwrap();
        assert!(output.contains("Error: failed to save DDL"));
        assert!(output.contains("=== Export complete ==="));
    }

    #[tokio::test]
    async fn test_per_table_mode() {
        let dir = tempdir().unwrap();
        let mut source = FakeSource::new(&["users", "orders"], &[]);
        let mut sel = selector("0\n");
        let w = SchemaWriter::new(OutputSpec {
            directory: dir.path().to_string_lossy().into_owned(),
            filename_format: "{database}_{table}".to_string(),
        });

        let summary = run_session(&mut source, "shop", &mut sel, &w, OutputMode::PerTable)
            .await
            .unwrap();

        assert_eq!(
            summary.written,
            vec![dir.path().join("shop_orders.sql"), dir.path().join("shop_users.sql")]
        );
    }

    #[tokio::test]
    async fn test_per_table_write_failure_lists_saved_files() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("shop_users.sql")).unwrap();
        let mut source = FakeSource::new(&["users", "orders"], &[]);
        let mut sel = selector("0\n");
        let w = SchemaWriter::new(OutputSpec {
            directory: dir.path().to_string_lossy().into_owned(),
            filename_format: "{database}_{table}".to_string(),
        });

        let summary = run_session(&mut source, "shop", &mut sel, &w, OutputMode::PerTable)
            .await
            .unwrap();

        assert_eq!(summary.written, vec![dir.path().join("shop_orders.sql")]);
        assert!(summary.write_error.is_some());

        let output = String::from_utf8(sel.into_output()).unwrap();
        assert!(output.contains(&format!("Saved: {}", dir.path().join("shop_orders.sql").display())));
        assert!(output.contains("Error: failed to save DDL"));
    }

    #[tokio::test]
    async fn test_export_rejects_empty_profile_list() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(&config, "databases: []\n").unwrap();

        let err = export(&config, OutputMode::Aggregate).await.unwrap_err();
        assert!(err.to_string().contains("No database profiles"));
    }

    #[tokio::test]
    async fn test_export_missing_config() {
        let dir = tempdir().unwrap();
        let err = export(&dir.path().join("missing.yaml"), OutputMode::Aggregate)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to load configuration"));
        assert!(matches!(
            err.downcast_ref::<ExportError>(),
            Some(ExportError::Config { .. })
        ));
    }
}
