//! Error types for the migration engine
//!
//! Every error is fatal to a run: nothing in the engine retries or recovers
//! locally. Migrations committed before the failure stay applied.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for migration operations
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Error types for migration operations
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Missing or invalid configuration (e.g. no connection string)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Could not open the database connection
    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// Migrations directory could not be read
    #[error("Failed to read migrations directory {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration file could not be read as text
    #[error("Failed to read migration file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File name does not follow `{version}_{name}.sql`
    #[error("Invalid migration name: {0}")]
    MalformedFilename(String),

    /// Two local files carry the same version
    #[error("Duplicate migration version {version}: {first} and {second}")]
    DuplicateVersion {
        version: String,
        first: String,
        second: String,
    },

    /// Ledger schema or table could not be created
    #[error("Failed to provision migrations ledger: {0}")]
    Provisioning(#[source] sqlx::Error),

    /// Ledger rows could not be read
    #[error("Failed to query applied migrations: {0}")]
    Ledger(#[source] sqlx::Error),

    /// Transaction for a migration could not be opened
    #[error("Failed to start transaction for migration {version}: {source}")]
    Transaction {
        version: String,
        #[source]
        source: sqlx::Error,
    },

    /// A statement of a migration failed; the migration was rolled back
    #[error("Failed to execute statement {index} of migration {version}: {source}")]
    Statement {
        version: String,
        index: usize,
        #[source]
        source: sqlx::Error,
    },

    /// The ledger insert for a migration failed
    #[error("Failed to record migration {version}: {source}")]
    Record {
        version: String,
        #[source]
        source: sqlx::Error,
    },

    /// Another run recorded this version first
    #[error("Migration {version} was recorded concurrently by another run")]
    AlreadyRecorded { version: String },

    /// Commit of a migration failed; nothing of it is durable
    #[error("Failed to commit migration {version}: {source}")]
    Commit {
        version: String,
        #[source]
        source: sqlx::Error,
    },

    /// The run was cancelled
    #[error("Migration run cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether the error happened before any database contact
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MigrateError::MalformedFilename("create_users.sql".to_string());
        assert_eq!(err.to_string(), "Invalid migration name: create_users.sql");

        let err = MigrateError::DuplicateVersion {
            version: "20240101000000".to_string(),
            first: "20240101000000_a.sql".to_string(),
            second: "20240101000000_b.sql".to_string(),
        };
        assert!(err.to_string().contains("20240101000000_a.sql"));
        assert!(err.to_string().contains("20240101000000_b.sql"));

        let err = MigrateError::configuration("DATABASE_URL environment variable is required");
        assert!(err.is_configuration());
        assert!(!MigrateError::Cancelled.is_configuration());
    }
}
