// ABOUTME: MySQL connection lifecycle built on a single sqlx connection
// ABOUTME: Handles connect options, liveness ping, and idempotent close

use super::schema;
use crate::config::DatabaseProfile;
use crate::error::{ExportError, Result};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};

/// An open MySQL connection scoped to one export run
pub struct MySqlSession {
    conn: Option<MySqlConnection>,
}

/// Connect to MySQL and verify the connection with a ping
///
/// The options mirror the profile's DSN: utf8mb4 charset and the server's own
/// time zone for the session.
///
/// # Errors
///
/// Returns [`ExportError::Connection`] if the server cannot be reached,
/// rejects the credentials, or does not answer the ping. A connection that
/// fails the ping is closed before returning.
pub async fn connect(profile: &DatabaseProfile) -> Result<MySqlSession> {
    let address = format!("{}:{}", profile.host, profile.resolved_port());

    let mut conn = connect_options(profile)
        .connect()
        .await
        .map_err(|e| ExportError::connection(format!("failed to connect to MySQL at {}", address), e))?;

    if let Err(e) = conn.ping().await {
        if let Err(close_err) = conn.close().await {
            tracing::debug!("Error closing MySQL connection after failed ping: {}", close_err);
        }
        return Err(ExportError::connection(
            format!("MySQL at {} did not answer ping", address),
            e,
        ));
    }

    Ok(MySqlSession { conn: Some(conn) })
}

fn connect_options(profile: &DatabaseProfile) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&profile.host)
        .port(profile.resolved_port())
        .username(&profile.username)
        .password(&profile.password)
        .database(&profile.database)
        .charset("utf8mb4")
        .timezone(None::<String>)
}

impl MySqlSession {
    fn conn(&mut self) -> Result<&mut MySqlConnection> {
        self.conn.as_mut().ok_or_else(|| ExportError::Query {
            context: "MySQL connection is already closed".to_string(),
            source: None,
        })
    }

    pub async fn list_tables(&mut self) -> Result<Vec<String>> {
        schema::list_tables(self.conn()?).await
    }

    pub async fn table_ddl(&mut self, table: &str) -> Result<String> {
        schema::show_create_table(self.conn()?, table).await
    }

    /// Close the connection; later calls are no-ops
    pub async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                tracing::warn!("Error while closing MySQL connection: {}", e);
            }
        }
    }
}
