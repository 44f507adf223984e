//! Database configuration loaded from the environment

use std::fmt;

use crate::error::{MigrateError, MigrateResult};

/// Environment variable holding the PostgreSQL connection string
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Connection settings for the target database
#[derive(Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
}

impl DatabaseConfig {
    /// Create a configuration from an explicit connection string
    pub fn new(url: impl Into<String>) -> MigrateResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(MigrateError::configuration(format!(
                "{} environment variable is required",
                DATABASE_URL_ENV
            )));
        }
        Ok(Self { url })
    }

    /// Load the configuration from `DATABASE_URL`
    ///
    /// A missing or empty variable is a configuration error; no connection
    /// is attempted here.
    pub fn from_env() -> MigrateResult<Self> {
        let url = std::env::var(DATABASE_URL_ENV).unwrap_or_default();
        Self::new(url)
    }
}

// Connection strings carry credentials
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .finish()
    }
}
