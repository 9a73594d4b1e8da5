// ABOUTME: YAML configuration loading for database profiles and output settings
// ABOUTME: Builds per-dialect connection strings from a profile

use crate::error::{ExportError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Top-level configuration file contents
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub databases: Vec<DatabaseProfile>,
    #[serde(default)]
    pub output: OutputSpec,
}

/// One configured database connection target
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseProfile {
    pub name: String,
    /// Dialect tag as written in the config ("mysql" or "postgres")
    #[serde(rename = "type")]
    pub db_type: String,
    pub host: String,
    /// Falls back to the dialect's default port when omitted
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
    /// PostgreSQL only
    #[serde(default)]
    pub sslmode: Option<String>,
}

/// Where and under which name exported files are written
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputSpec {
    #[serde(default = "default_output_directory")]
    pub directory: String,
    /// Template with a `{database}` placeholder; `.sql` is appended if absent
    #[serde(default = "default_filename_format")]
    pub filename_format: String,
}

fn default_output_directory() -> String {
    "output".to_string()
}

fn default_filename_format() -> String {
    "{database}_all_tables_ddl".to_string()
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            filename_format: default_filename_format(),
        }
    }
}

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Postgres,
}

impl Dialect {
    /// Resolve a config tag; unknown tags yield `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "mysql" => Some(Self::MySql),
            "postgres" => Some(Self::Postgres),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::MySql => 3306,
            Self::Postgres => 5432,
        }
    }

    /// Build the data source name for a profile
    ///
    /// MySQL uses the `user:pass@tcp(host:port)/db?options` form with fixed
    /// charset and time zone options. PostgreSQL uses `key=value` pairs with
    /// `sslmode` defaulting to `disable`.
    pub fn build_dsn(self, profile: &DatabaseProfile) -> String {
        let port = profile.port.unwrap_or_else(|| self.default_port());
        match self {
            Self::MySql => format!(
                "{}:{}@tcp({}:{})/{}?charset=utf8mb4&parseTime=True&loc=Local",
                profile.username, profile.password, profile.host, port, profile.database
            ),
            Self::Postgres => format!(
                "host={} port={} user={} password={} dbname={} sslmode={}",
                quote_pg_value(&profile.host),
                port,
                quote_pg_value(&profile.username),
                quote_pg_value(&profile.password),
                quote_pg_value(&profile.database),
                quote_pg_value(profile.ssl_mode()),
            ),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DatabaseProfile {
    /// Resolve the dialect tag into the closed variant
    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_tag(&self.db_type).ok_or_else(|| ExportError::UnsupportedDialect {
            dialect: self.db_type.clone(),
        })
    }

    /// Configured port, or the dialect default (0 for unknown dialects)
    pub fn resolved_port(&self) -> u16 {
        self.port.unwrap_or_else(|| {
            Dialect::from_tag(&self.db_type)
                .map(Dialect::default_port)
                .unwrap_or(0)
        })
    }

    /// `sslmode` with empty or missing values treated as `disable`
    pub fn ssl_mode(&self) -> &str {
        match self.sslmode.as_deref() {
            Some(mode) if !mode.trim().is_empty() => mode.trim(),
            _ => "disable",
        }
    }

    /// Data source name for this profile; empty for an unsupported dialect
    pub fn dsn(&self) -> String {
        self.dialect()
            .map(|dialect| dialect.build_dsn(self))
            .unwrap_or_default()
    }

    /// DSN with the password masked, safe for logs
    pub fn redacted_dsn(&self) -> String {
        let masked = Self {
            password: "****".to_string(),
            ..self.clone()
        };
        masked.dsn()
    }
}

impl fmt::Debug for DatabaseProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseProfile")
            .field("name", &self.name)
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"****")
            .field("database", &self.database)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

/// Quote a value for a libpq-style `key=value` connection string when needed
fn quote_pg_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');

    if needs_quotes {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    } else {
        value.to_string()
    }
}

/// Load configuration from a YAML file
///
/// # Errors
///
/// Returns [`ExportError::Config`] if the file cannot be read or is not valid
/// YAML for the expected structure. An empty `databases` list is not an error
/// here; callers reject it before prompting.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    tracing::debug!("Loading configuration from {}", path.display());

    let contents = std::fs::read_to_string(path).map_err(|e| {
        ExportError::config(format!("failed to read config file {}", path.display()), e)
    })?;

    parse_config(&contents)
        .map_err(|e| ExportError::config(format!("failed to parse config file {}", path.display()), e))
}

fn parse_config(contents: &str) -> std::result::Result<Config, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}
