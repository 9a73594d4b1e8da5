// ABOUTME: Writes exported DDL to SQL files under the configured output directory
// ABOUTME: Renders a header, a sorted table of contents, and one section per table

use crate::config::OutputSpec;
use crate::error::{ExportError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name written into generated file headers
pub const TOOL_NAME: &str = "table-ddl-exporter";

/// Table name to DDL, iterated in ascending table-name order
pub type ExportResult = BTreeMap<String, String>;

const SECTION_RULE: &str = "-- ============================================";

/// A per-table write that stopped early
///
/// Files written before the failure stay on disk and are listed in `written`.
#[derive(Debug)]
pub struct PartialWrite {
    pub written: Vec<PathBuf>,
    pub source: ExportError,
}

impl From<ExportError> for PartialWrite {
    fn from(source: ExportError) -> Self {
        Self {
            written: Vec::new(),
            source,
        }
    }
}

/// Renders and persists exported DDL according to an [`OutputSpec`]
#[derive(Debug, Clone)]
pub struct SchemaWriter {
    spec: OutputSpec,
}

impl SchemaWriter {
    /// Create a writer for the given output directory and filename template
    pub fn new(spec: OutputSpec) -> Self {
        Self { spec }
    }

    pub fn output_directory(&self) -> &Path {
        Path::new(&self.spec.directory)
    }

    /// Create the output directory (recursively) if it does not exist
    ///
    /// Returns `true` when the directory had to be created.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the directory cannot be created, for
    /// example because a file already occupies the path.
    pub fn ensure_output_directory(&self) -> Result<bool> {
        let dir = self.output_directory();
        if dir.is_dir() {
            return Ok(false);
        }

        std::fs::create_dir_all(dir).map_err(|e| {
            ExportError::io(
                format!("failed to create output directory {}", dir.display()),
                e,
            )
        })?;
        tracing::info!("Created output directory {}", dir.display());
        Ok(true)
    }

    /// File name for the aggregate export of a database
    ///
    /// # Examples
    ///
    /// ```
    /// # use table_ddl_exporter::config::OutputSpec;
    /// # use table_ddl_exporter::writer::SchemaWriter;
    /// let writer = SchemaWriter::new(OutputSpec {
    ///     directory: "out".to_string(),
    ///     filename_format: "{database}_schema".to_string(),
    /// });
    /// assert_eq!(writer.file_name("shop"), "shop_schema.sql");
    /// ```
    pub fn file_name(&self, database: &str) -> String {
        let name = self
            .spec
            .filename_format
            .replace("{database}", database)
            .replace("{table}", "all_tables");
        with_sql_extension(name)
    }

    /// File name for a single table in per-table mode
    ///
    /// Templates without a `{table}` placeholder get `_<table>` appended to the
    /// stem so that files never overwrite each other.
    pub fn table_file_name(&self, database: &str, table: &str) -> String {
        let format = self.spec.filename_format.as_str();
        let name = if format.contains("{table}") {
            format.replace("{database}", database).replace("{table}", table)
        } else {
            let stem = format.strip_suffix(".sql").unwrap_or(format);
            format!("{}_{}", stem.replace("{database}", database), table)
        };
        with_sql_extension(name)
    }

    /// Render the aggregate file contents
    pub fn render(database: &str, tables: &ExportResult, exported_at: &str) -> String {
        let mut content = String::new();

        content.push_str(&format!("-- Database: {}\n", database));
        content.push_str(&format!("-- Exported at: {}\n", exported_at));
        content.push_str(&format!("-- Tables: {}\n", tables.len()));
        content.push_str(&format!("-- Generated by: {}\n", TOOL_NAME));
        content.push('\n');

        content.push_str("-- Table of contents:\n");
        for (i, table) in tables.keys().enumerate() {
            content.push_str(&format!("--   {}. {}\n", i + 1, table));
        }

        for (table, ddl) in tables {
            content.push('\n');
            content.push_str(SECTION_RULE);
            content.push('\n');
            content.push_str(&format!("-- Table: {}\n", table));
            content.push_str(SECTION_RULE);
            content.push_str("\n\n");
            content.push_str(ddl);
            content.push('\n');
        }

        content
    }

    /// Write every table into one file and return its path
    ///
    /// # Arguments
    ///
    /// * `database` - Database name, substituted for `{database}` and written
    ///   into the header
    /// * `tables` - Table name to DDL; sections follow ascending name order
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the output directory cannot be created
    /// or the file cannot be written. Nothing is written in that case.
    pub fn write_all(&self, database: &str, tables: &ExportResult) -> Result<PathBuf> {
        self.ensure_output_directory()?;

        let path = self.output_directory().join(self.file_name(database));
        let content = Self::render(database, tables, &timestamp());
        write_file(&path, &content)?;

        tracing::info!("✓ Saved {} table(s) to {}", tables.len(), path.display());
        Ok(path)
    }

    /// Write one file per table and return the paths in table order
    ///
    /// # Errors
    ///
    /// Stops at the first file that cannot be written and returns a
    /// [`PartialWrite`] carrying the paths written before it.
    pub fn write_per_table(
        &self,
        database: &str,
        tables: &ExportResult,
    ) -> std::result::Result<Vec<PathBuf>, PartialWrite> {
        self.ensure_output_directory()?;

        let exported_at = timestamp();
        let mut paths = Vec::with_capacity(tables.len());
        for (table, ddl) in tables {
            let path = self
                .output_directory()
                .join(self.table_file_name(database, table));
            let content = format!(
                "-- Database: {}\n-- Table: {}\n-- Exported at: {}\n-- Generated by: {}\n\n{}\n",
                database, table, exported_at, TOOL_NAME, ddl
            );
            if let Err(source) = write_file(&path, &content) {
                tracing::warn!("⚠ Stopped after {} table file(s)", paths.len());
                return Err(PartialWrite {
                    written: paths,
                    source,
                });
            }
            tracing::debug!("Saved {}", path.display());
            paths.push(path);
        }

        tracing::info!("✓ Saved {} table file(s)", paths.len());
        Ok(paths)
    }
}

fn with_sql_extension(mut name: String) -> String {
    if !name.ends_with(".sql") {
        name.push_str(".sql");
    }
    name
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .map_err(|e| ExportError::io(format!("failed to write {}", path.display()), e))
}
