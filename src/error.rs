// ABOUTME: Error taxonomy for configuration, connection, query, and input failures
// ABOUTME: Shared by every module of the exporter; the binary wraps it in anyhow

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while exporting table DDL
#[derive(Debug, Error)]
pub enum ExportError {
    /// Config file unreadable or malformed
    #[error("Configuration error: {context}")]
    Config {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Dial, authentication, or ping failure
    #[error("Database connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Dialect tag outside {mysql, postgres}
    #[error("Unsupported database type: '{dialect}' (expected 'mysql' or 'postgres')")]
    UnsupportedDialect { dialect: String },

    /// Table listing or DDL fetch failure
    #[error("Query failed: {context}")]
    Query {
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Input stream reached end of file
    #[error("Failed to read input: input stream closed")]
    InputClosed,

    /// Input stream could not be read
    #[error("Failed to read input")]
    Input(#[source] std::io::Error),

    /// User answered the confirmation prompt negatively
    #[error("Export cancelled by user")]
    UserCancelled,

    /// Terminal output, directory creation, or file write failure
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub(crate) fn config(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Config {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn connection(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn query(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Query {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results with ExportError
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_connection_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ExportError::connection("could not reach db.local:5432", io);

        assert_eq!(
            err.to_string(),
            "Database connection failed: could not reach db.local:5432"
        );
        assert_eq!(err.source().unwrap().to_string(), "refused");
    }

    #[test]
    fn test_unsupported_dialect_names_the_tag() {
        let err = ExportError::UnsupportedDialect {
            dialect: "oracle".to_string(),
        };
        assert!(err.to_string().contains("'oracle'"));
    }
}
