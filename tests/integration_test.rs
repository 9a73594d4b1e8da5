// ABOUTME: Integration tests for configuration loading and the export workflow
// ABOUTME: Live database tests are ignored and read TEST_MYSQL_*/TEST_POSTGRES_* variables

use async_trait::async_trait;
use std::env;
use std::io::Cursor;
use table_ddl_exporter::commands::{run_session, OutputMode};
use table_ddl_exporter::config::{load_config, DatabaseProfile, Dialect, OutputSpec};
use table_ddl_exporter::connection::{DatabaseConnection, SchemaSource};
use table_ddl_exporter::error::{ExportError, Result};
use table_ddl_exporter::interactive::Selector;
use table_ddl_exporter::writer::SchemaWriter;
use tempfile::tempdir;

struct StaticSource(Vec<(&'static str, &'static str)>);

#[async_trait]
impl SchemaSource for StaticSource {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        Ok(self.0.iter().map(|(name, _)| name.to_string()).collect())
    }

    async fn table_ddl(&mut self, table: &str) -> Result<String> {
        self.0
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, ddl)| ddl.to_string())
            .ok_or_else(|| ExportError::Query {
                context: format!("unknown table {}", table),
                source: None,
            })
    }
}

/// Helper to build a profile from environment variables with the given prefix
fn profile_from_env(prefix: &str, db_type: &str) -> Option<DatabaseProfile> {
    let host = env::var(format!("{}_HOST", prefix)).ok()?;
    Some(DatabaseProfile {
        name: format!("{}-test", db_type),
        db_type: db_type.to_string(),
        host,
        port: env::var(format!("{}_PORT", prefix))
            .ok()
            .and_then(|p| p.parse().ok()),
        username: env::var(format!("{}_USER", prefix)).unwrap_or_default(),
        password: env::var(format!("{}_PASSWORD", prefix)).unwrap_or_default(),
        database: env::var(format!("{}_DATABASE", prefix)).unwrap_or_default(),
        sslmode: env::var(format!("{}_SSLMODE", prefix)).ok(),
    })
}

#[test]
fn test_example_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.yaml");
    let config = load_config(path).unwrap();

    assert_eq!(config.databases.len(), 2);
    assert_eq!(config.databases[0].dialect().unwrap(), Dialect::MySql);
    assert_eq!(config.databases[1].dialect().unwrap(), Dialect::Postgres);
    assert!(config.databases[1].dsn().contains("sslmode=disable"));
    assert_eq!(config.output.directory, "./output");
}

#[test]
fn test_malformed_config_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "databases: {not: [a list").unwrap();

    assert!(matches!(load_config(&path), Err(ExportError::Config { .. })));
}

#[tokio::test]
async fn test_session_exports_selected_tables_in_sorted_order() {
    let dir = tempdir().unwrap();
    let writer = SchemaWriter::new(OutputSpec {
        directory: dir.path().join("ddl").to_string_lossy().into_owned(),
        filename_format: "{database}_schema.sql".to_string(),
    });
    let mut source = StaticSource(vec![
        ("zeta", "CREATE TABLE zeta (id int);"),
        ("alpha", "CREATE TABLE alpha (id int);"),
        ("mid", "CREATE TABLE mid (id int);"),
    ]);
    let mut selector = Selector::new(Cursor::new(b"1,2,3\ny\n".to_vec()), Vec::new());

    let summary = run_session(&mut source, "shop", &mut selector, &writer, OutputMode::Aggregate)
        .await
        .unwrap();

    let path = dir.path().join("ddl").join("shop_schema.sql");
    assert_eq!(summary.written, vec![path.clone()]);

    let content = std::fs::read_to_string(path).unwrap();
    let order: Vec<&str> = content
        .lines()
        .filter_map(|line| line.strip_prefix("-- Table: "))
        .collect();
    assert_eq!(order, vec!["alpha", "mid", "zeta"]);
}

#[tokio::test]
#[ignore]
async fn test_mysql_export_integration() {
    let profile = profile_from_env("TEST_MYSQL", "mysql").expect("TEST_MYSQL_HOST must be set");
    let dir = tempdir().unwrap();
    let writer = SchemaWriter::new(OutputSpec {
        directory: dir.path().to_string_lossy().into_owned(),
        filename_format: "{database}".to_string(),
    });

    let mut connection = DatabaseConnection::connect(&profile).await.unwrap();
    let mut selector = Selector::new(Cursor::new(b"0\n".to_vec()), Vec::new());
    let result = run_session(
        &mut connection,
        &profile.database,
        &mut selector,
        &writer,
        OutputMode::Aggregate,
    )
    .await;
    connection.close().await;

    let summary = result.unwrap();
    println!("✓ Exported {}/{} MySQL tables", summary.succeeded, summary.total);
    assert!(summary.failed.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_postgres_export_integration() {
    let profile =
        profile_from_env("TEST_POSTGRES", "postgres").expect("TEST_POSTGRES_HOST must be set");
    let dir = tempdir().unwrap();
    let writer = SchemaWriter::new(OutputSpec {
        directory: dir.path().to_string_lossy().into_owned(),
        filename_format: "{database}_{table}".to_string(),
    });

    let mut connection = DatabaseConnection::connect(&profile).await.unwrap();
    let mut selector = Selector::new(Cursor::new(b"0\n".to_vec()), Vec::new());
    let result = run_session(
        &mut connection,
        &profile.database,
        &mut selector,
        &writer,
        OutputMode::PerTable,
    )
    .await;
    connection.close().await;

    match result {
        Ok(summary) => {
            println!("✓ Exported {}/{} PostgreSQL tables", summary.succeeded, summary.total);
            assert_eq!(summary.written.len(), summary.succeeded);
        }
        Err(e) => panic!("PostgreSQL export failed: {:?}", e),
    }
}
