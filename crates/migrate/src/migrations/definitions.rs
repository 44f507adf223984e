//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the fundamental types used throughout the migration system including
//! Migration, LedgerEntry, and MigrationConfig structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default directory holding migration files
pub const DEFAULT_MIGRATIONS_DIR: &str = "./supabase/migrations";

/// Schema that holds the ledger table
pub const LEDGER_SCHEMA: &str = "supabase_migrations";

/// Ledger table name
pub const LEDGER_TABLE: &str = "schema_migrations";

/// Origin marker written to `created_by`
pub const CREATED_BY: &str = "supabase-direct-migrate";

/// Represents a database migration loaded from disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// Filename prefix before the first `_`; sort key and ledger primary key
    pub version: String,
    /// Human-readable name for the migration
    pub name: String,
    /// Unparsed file content
    pub raw_content: String,
    /// Statements split on the breakpoint marker, in file order
    pub statements: Vec<String>,
    /// SHA-256 hex digest of `raw_content`
    pub content_hash: String,
}

/// A row of the migrations ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub version: String,
    pub name: String,
    pub hash: String,
    pub statements: Vec<String>,
    /// Assigned by the server on insert
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    /// Reserved, always NULL when written by this tool
    pub idempotency_key: Option<String>,
}

/// Configuration for the migration system
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Directory where migration files are stored
    pub migrations_dir: PathBuf,
    /// Schema containing the ledger table
    pub ledger_schema: String,
    /// Table name for tracking migrations
    pub ledger_table: String,
    /// Value recorded in `created_by`
    pub created_by: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            ledger_schema: LEDGER_SCHEMA.to_string(),
            ledger_table: LEDGER_TABLE.to_string(),
            created_by: CREATED_BY.to_string(),
        }
    }
}

impl MigrationConfig {
    /// Default configuration reading migrations from `dir`
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: dir.into(),
            ..Default::default()
        }
    }
}

/// Result of running migrations
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationRunResult {
    /// Number of local migration files discovered
    pub discovered: usize,
    /// Versions applied by this run, in order
    pub applied: Vec<String>,
    /// Versions that were already in the ledger
    pub skipped: Vec<String>,
    /// Applied versions whose file no longer matches the recorded hash
    pub drifted: Vec<String>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl MigrationRunResult {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// Migration status relative to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationStatus {
    /// Not yet applied
    Pending,
    /// Applied and the file still hashes to the recorded value
    Applied,
    /// Applied, but the file changed since
    Drifted {
        /// Hash stored in the ledger
        recorded_hash: String,
    },
}

impl MigrationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, MigrationStatus::Pending)
    }
}
