// ABOUTME: PostgreSQL table discovery and CREATE TABLE reconstruction
// ABOUTME: Rebuilds column definitions from information_schema.columns

use crate::error::{ExportError, Result};
use tokio_postgres::Client;

/// One row of `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub character_maximum_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
}

impl ColumnInfo {
    /// Render as an indented column definition line
    pub fn definition(&self) -> String {
        let mut def = format!("    {} {}", self.name, self.data_type);

        if let Some(length) = self.character_maximum_length {
            def.push_str(&format!("({})", length));
        } else if let (true, Some(precision), Some(scale)) = (
            self.takes_precision(),
            self.numeric_precision,
            self.numeric_scale,
        ) {
            def.push_str(&format!("({},{})", precision, scale));
        }

        if !self.is_nullable {
            def.push_str(" NOT NULL");
        }

        if let Some(default) = &self.default {
            def.push_str(&format!(" DEFAULT {}", default));
        }

        def
    }

    // Integer and float types also report a precision, but it is implied by the type
    fn takes_precision(&self) -> bool {
        matches!(self.data_type.as_str(), "numeric" | "decimal")
    }
}

/// List tables in the `public` schema, in server order
///
/// # Errors
///
/// Returns [`ExportError::Query`] if the `pg_tables` query fails.
pub async fn list_tables(client: &Client) -> Result<Vec<String>> {
    let rows = client
        .query(
            "SELECT tablename FROM pg_catalog.pg_tables WHERE schemaname = 'public'",
            &[],
        )
        .await
        .map_err(|e| ExportError::query("failed to list PostgreSQL tables", e))?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// Read column metadata for a `public` table, ordered by position
///
/// # Errors
///
/// Returns [`ExportError::Query`] if the `information_schema.columns` query
/// fails.
pub async fn table_columns(client: &Client, table: &str) -> Result<Vec<ColumnInfo>> {
    let rows = client
        .query(
            "SELECT
                column_name::text,
                data_type::text,
                is_nullable::text,
                column_default::text,
                character_maximum_length::int4,
                numeric_precision::int4,
                numeric_scale::int4
             FROM information_schema.columns
             WHERE table_name = $1::text AND table_schema = 'public'
             ORDER BY ordinal_position",
            &[&table],
        )
        .await
        .map_err(|e| {
            ExportError::query(format!("failed to read columns of '{}'", table), e)
        })?;

    let columns = rows
        .iter()
        .map(|row| {
            let is_nullable: String = row.get(2);
            ColumnInfo {
                name: row.get(0),
                data_type: row.get(1),
                is_nullable: is_nullable != "NO",
                default: row.get(3),
                character_maximum_length: row.get(4),
                numeric_precision: row.get(5),
                numeric_scale: row.get(6),
            }
        })
        .collect();

    Ok(columns)
}

/// Assemble a `CREATE TABLE` statement from column metadata
///
/// Only column names, types, nullability and defaults are reproduced. Primary
/// keys, indexes, foreign keys, check constraints and storage options are not.
pub fn build_create_table(table: &str, columns: &[ColumnInfo]) -> String {
    let definitions: Vec<String> = columns.iter().map(ColumnInfo::definition).collect();
    format!("CREATE TABLE {} (\n{}\n);", table, definitions.join(",\n"))
}

/// Reconstruct the DDL of one table
///
/// # Arguments
///
/// * `client` - Open PostgreSQL client
/// * `table` - Table name in the `public` schema
///
/// # Returns
///
/// A `CREATE TABLE` statement built by [`build_create_table`].
///
/// # Errors
///
/// Returns [`ExportError::Query`] if the column query fails or the table has
/// no columns (it does not exist in `public`).
pub async fn table_ddl(client: &Client, table: &str) -> Result<String> {
    let columns = table_columns(client, table).await?;
    if columns.is_empty() {
        return Err(ExportError::Query {
            context: format!("table '{}' not found in schema 'public'", table),
            source: None,
        });
    }
    Ok(build_create_table(table, &columns))
}
