// ABOUTME: PostgreSQL connection utilities for profile-based exports
// ABOUTME: Handles key=value DSN parsing, TLS setup, and connection lifecycle

use super::schema;
use crate::config::DatabaseProfile;
use crate::error::{ExportError, Result};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio::task::JoinHandle;
use tokio_postgres::config::SslMode;
use tokio_postgres::Client;

/// An open PostgreSQL connection scoped to one export run
pub struct PostgresSession {
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
}

/// How a libpq `sslmode` value is applied to the driver and the TLS connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TlsPolicy {
    pub ssl_mode: SslMode,
    pub verify_certificate: bool,
    pub verify_hostname: bool,
}

/// Map a libpq `sslmode` name onto a [`TlsPolicy`]
///
/// The driver only knows disable/prefer/require, so `allow` negotiates like
/// `prefer` and the `verify-*` modes require TLS with certificate checks.
/// `prefer` and `require` encrypt without verifying the server certificate.
///
/// # Errors
///
/// Returns [`ExportError::Connection`] for a mode libpq does not define.
pub(crate) fn tls_policy(mode: &str) -> Result<TlsPolicy> {
    let (ssl_mode, verify_certificate, verify_hostname) = match mode {
        "disable" => (SslMode::Disable, false, false),
        "allow" | "prefer" => (SslMode::Prefer, false, false),
        "require" => (SslMode::Require, false, false),
        "verify-ca" => (SslMode::Require, true, false),
        "verify-full" => (SslMode::Require, true, true),
        other => {
            return Err(ExportError::connection(
                "invalid PostgreSQL connection settings",
                format!(
                    "unsupported sslmode '{}' (expected disable, allow, prefer, require, verify-ca or verify-full)",
                    other
                ),
            ))
        }
    };
    Ok(TlsPolicy {
        ssl_mode,
        verify_certificate,
        verify_hostname,
    })
}

/// Connect to PostgreSQL with TLS support and verify with a ping
///
/// # Errors
///
/// Returns [`ExportError::Connection`] if the `sslmode` is unknown, the TLS
/// connector cannot be built, the server cannot be reached or rejects the
/// credentials, or the ping fails.
pub async fn connect(profile: &DatabaseProfile) -> Result<PostgresSession> {
    let policy = tls_policy(profile.ssl_mode())?;

    let mut config = tokio_postgres::Config::new();
    config
        .host(&profile.host)
        .port(profile.resolved_port())
        .user(&profile.username)
        .password(&profile.password)
        .dbname(&profile.database)
        .ssl_mode(policy.ssl_mode);

    // TLS is only negotiated when sslmode asks for it
    let tls_connector = TlsConnector::builder()
        .danger_accept_invalid_certs(!policy.verify_certificate)
        .danger_accept_invalid_hostnames(!policy.verify_hostname)
        .build()
        .map_err(|e| ExportError::connection("failed to build TLS connector", e))?;
    let tls = MakeTlsConnector::new(tls_connector);

    let (client, connection) = config
        .connect(tls)
        .await
        .map_err(|e| ExportError::connection(describe_connect_failure(&e.to_string()), e))?;

    // Spawn connection handler
    let driver = tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    let mut session = PostgresSession {
        client: Some(client),
        driver: Some(driver),
    };

    if let Err(e) = session.ping().await {
        session.close().await;
        return Err(e);
    }

    Ok(session)
}

/// Turn a driver error message into a message with a hint for the user
fn describe_connect_failure(error_msg: &str) -> String {
    if error_msg.contains("password authentication failed") {
        "Authentication failed: invalid username or password".to_string()
    } else if error_msg.contains("database") && error_msg.contains("does not exist") {
        "Database does not exist; check the 'database' field of the profile".to_string()
    } else if error_msg.contains("Connection refused") || error_msg.contains("could not connect") {
        "Connection refused: check host and port, and that the server is running".to_string()
    } else if error_msg.contains("timeout") || error_msg.contains("timed out") {
        "Connection timeout: the database server did not respond in time".to_string()
    } else if error_msg.contains("SSL") || error_msg.contains("TLS") {
        "TLS/SSL error: check the 'sslmode' setting of the profile".to_string()
    } else if error_msg.contains("no pg_hba.conf entry") {
        "Access denied: no pg_hba.conf entry for this host".to_string()
    } else {
        "Failed to connect to PostgreSQL".to_string()
    }
}

impl PostgresSession {
    fn client(&self) -> Result<&Client> {
        self.client.as_ref().ok_or_else(|| ExportError::Query {
            context: "PostgreSQL connection is already closed".to_string(),
            source: None,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.client()?
            .simple_query("SELECT 1")
            .await
            .map_err(|e| ExportError::connection("PostgreSQL did not answer ping", e))?;
        Ok(())
    }

    pub async fn list_tables(&mut self) -> Result<Vec<String>> {
        schema::list_tables(self.client()?).await
    }

    pub async fn table_ddl(&mut self, table: &str) -> Result<String> {
        schema::table_ddl(self.client()?, table).await
    }

    /// Drop the client and wait for the connection task; later calls are no-ops
    pub async fn close(&mut self) {
        drop(self.client.take());
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                tracing::warn!("PostgreSQL connection task ended abnormally: {}", e);
            }
        }
    }
}
