//! Export configuration
//!
//! Everything a run needs is passed in explicitly; nothing is read from constants or the
//! environment inside the library.

use crate::SchemaVariant;
use std::fmt;
use std::path::PathBuf;

/// Default PostgreSQL port
pub const DEFAULT_DB_PORT: u16 = 5432;

/// Connection settings for the staging database
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatabaseConfig {
    /// Full connection URL; when set it takes precedence over the individual fields
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    /// Optional, trust/peer authentication works without it
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: DEFAULT_DB_PORT,
            database: "ahti_staging".to_string(),
            user: "ahti_builder".to_string(),
            password: None,
        }
    }
}

// Secrets are redacted
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(_) => f.write_str("<database url>"),
            None => write!(
                f,
                "{}@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
        }
    }
}

/// Configuration of one export run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportConfig {
    /// Output schema
    pub schema: SchemaVariant,
    /// Store to read from
    pub database: DatabaseConfig,
    /// Destination file
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_staging() {
        let config = DatabaseConfig::default();
        assert_eq!(config.to_string(), "ahti_builder@localhost:5432/ahti_staging");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = DatabaseConfig {
            url: Some("postgres://ahti:hunter2@db/ahti".to_string()),
            password: Some("hunter2".to_string()),
            ..DatabaseConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(config.to_string(), "<database url>");
    }
}
