// ABOUTME: Dialect-independent connection adapter over MySQL and PostgreSQL sessions
// ABOUTME: Chooses the dialect once at connect time and exposes table listing and DDL

use crate::config::{DatabaseProfile, Dialect};
use crate::error::Result;
use crate::{mysql, postgres};
use async_trait::async_trait;

/// Something that can list tables and produce their DDL
#[async_trait]
pub trait SchemaSource: Send {
    /// Table names in the order the database returns them
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Complete `CREATE TABLE` text for one table
    async fn table_ddl(&mut self, table: &str) -> Result<String>;
}

/// An open connection to one of the supported dialects
pub enum DatabaseConnection {
    MySql(mysql::MySqlSession),
    Postgres(postgres::PostgresSession),
}

impl DatabaseConnection {
    /// Open and ping-check a connection for the given profile
    ///
    /// # Errors
    ///
    /// - [`ExportError::UnsupportedDialect`](crate::error::ExportError::UnsupportedDialect)
    ///   if the profile's type is neither `mysql` nor `postgres`
    /// - [`ExportError::Connection`](crate::error::ExportError::Connection) if
    ///   the server cannot be reached, rejects the credentials, or fails the ping
    pub async fn connect(profile: &DatabaseProfile) -> Result<Self> {
        let dialect = profile.dialect()?;
        tracing::info!(
            "Connecting to '{}' ({}): {}",
            profile.name,
            dialect,
            profile.redacted_dsn()
        );

        let connection = match dialect {
            Dialect::MySql => Self::MySql(mysql::connect(profile).await?),
            Dialect::Postgres => Self::Postgres(postgres::connect(profile).await?),
        };

        tracing::info!("✓ Connected to '{}'", profile.name);
        Ok(connection)
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            Self::MySql(_) => Dialect::MySql,
            Self::Postgres(_) => Dialect::Postgres,
        }
    }

    /// Release the connection; safe to call more than once
    pub async fn close(&mut self) {
        tracing::debug!("Closing {} connection", self.dialect());
        match self {
            Self::MySql(session) => session.close().await,
            Self::Postgres(session) => session.close().await,
        }
    }
}

#[async_trait]
impl SchemaSource for DatabaseConnection {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        match self {
            Self::MySql(session) => session.list_tables().await,
            Self::Postgres(session) => session.list_tables().await,
        }
    }

    async fn table_ddl(&mut self, table: &str) -> Result<String> {
        match self {
            Self::MySql(session) => session.table_ddl(table).await,
            Self::Postgres(session) => session.table_ddl(table).await,
        }
    }
}
