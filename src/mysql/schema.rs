// ABOUTME: MySQL introspection via SHOW TABLES and SHOW CREATE TABLE
// ABOUTME: Returns table names and the server's own CREATE TABLE text

use crate::error::{ExportError, Result};
use sqlx::mysql::MySqlConnection;
use sqlx::Row;

/// List tables in the connected database, in server order
///
/// # Errors
///
/// Returns [`ExportError::Query`] if `SHOW TABLES` fails or a row cannot be
/// decoded as a table name.
pub async fn list_tables(conn: &mut MySqlConnection) -> Result<Vec<String>> {
    let rows = sqlx::query("SHOW TABLES")
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| ExportError::query("failed to list MySQL tables", e))?;

    rows.iter()
        .map(|row| {
            // SHOW results may be typed as binary strings depending on the server
            row.try_get_unchecked::<String, _>(0)
                .map_err(|e| ExportError::query("failed to read MySQL table name", e))
        })
        .collect()
}

/// Fetch the `CREATE TABLE` statement for one table, verbatim
///
/// # Arguments
///
/// * `conn` - Open MySQL connection
/// * `table` - Unquoted table name; quoted with [`quote_identifier`]
///
/// # Returns
///
/// The second column of `SHOW CREATE TABLE`, unchanged.
///
/// # Errors
///
/// Returns [`ExportError::Query`] if the table does not exist, the query
/// fails, or the result has no DDL column.
pub async fn show_create_table(conn: &mut MySqlConnection, table: &str) -> Result<String> {
    let sql = format!("SHOW CREATE TABLE {}", quote_identifier(table));

    let row = sqlx::query(&sql)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| ExportError::query(format!("failed to fetch MySQL DDL for '{}'", table), e))?;

    row.try_get_unchecked::<String, _>(1)
        .map_err(|e| ExportError::query(format!("failed to read MySQL DDL for '{}'", table), e))
}

/// Quote an identifier with backticks, doubling embedded backticks
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
