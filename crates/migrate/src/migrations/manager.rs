//! Migration Manager - File system operations for migrations
//!
//! Discovers `{version}_{name}.sql` files, splits them into statements and
//! hashes their content. Every candidate is parsed before anything is
//! returned, so one bad file name blocks the whole run instead of changing
//! which migrations apply.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::definitions::{Migration, MigrationConfig};
use super::hash::content_hash;
use crate::error::{MigrateError, MigrateResult};

/// Line that separates independently executed statements
pub const STATEMENT_BREAKPOINT: &str = "-- statement-breakpoint";

/// Recognized migration file extension
pub const MIGRATION_EXTENSION: &str = ".sql";

/// Migration manager for loading migrations
pub struct MigrationManager {
    config: MigrationConfig,
}

impl MigrationManager {
    /// Create a new migration manager with default configuration
    pub fn new() -> Self {
        Self::with_config(MigrationConfig::default())
    }

    /// Create a new migration manager with custom configuration
    pub fn with_config(config: MigrationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Load all migration files from the migrations directory, sorted by version
    pub fn load_migrations(&self) -> MigrateResult<Vec<Migration>> {
        let dir = &self.config.migrations_dir;
        let mut candidates = self.discover(dir)?;
        // read_dir order is platform dependent
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        let mut migrations = Vec::with_capacity(candidates.len());
        let mut file_names = Vec::with_capacity(candidates.len());
        for (file_name, path) in candidates {
            let (version, name) = parse_filename(&file_name)?;
            let raw_content = fs::read_to_string(&path)
                .map_err(|source| MigrateError::ReadFile { path: path.clone(), source })?;

            let statements = split_statements(&raw_content);
            debug!(
                "Parsed migration {} ({}) with {} statement(s)",
                version,
                name,
                statements.len()
            );

            migrations.push(Migration {
                content_hash: content_hash(&raw_content),
                version,
                name,
                raw_content,
                statements,
            });
            file_names.push(file_name);
        }

        let mut order: Vec<usize> = (0..migrations.len()).collect();
        order.sort_by(|&a, &b| migrations[a].version.cmp(&migrations[b].version));

        for pair in order.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            if migrations[first].version == migrations[second].version {
                return Err(MigrateError::DuplicateVersion {
                    version: migrations[first].version.clone(),
                    first: file_names[first].clone(),
                    second: file_names[second].clone(),
                });
            }
        }

        migrations.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(migrations)
    }

    /// List `.sql` files in `dir` as (file name, path)
    fn discover(&self, dir: &Path) -> MigrateResult<Vec<(String, PathBuf)>> {
        let discovery = |source| MigrateError::Discovery {
            path: dir.to_path_buf(),
            source,
        };

        let mut candidates = Vec::new();
        for entry in fs::read_dir(dir).map_err(discovery)? {
            let entry = entry.map_err(discovery)?;
            if entry.file_type().map_err(discovery)?.is_dir() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.ends_with(MIGRATION_EXTENSION) {
                candidates.push((file_name, entry.path()));
            }
        }
        Ok(candidates)
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `{version}_{name}.sql` into its version and name
///
/// The name may itself contain underscores; only the first one separates.
pub fn parse_filename(file_name: &str) -> MigrateResult<(String, String)> {
    let stem = file_name
        .strip_suffix(MIGRATION_EXTENSION)
        .unwrap_or(file_name);

    match stem.split_once('_') {
        Some((version, name)) if !version.is_empty() && !name.is_empty() => {
            Ok((version.to_string(), name.to_string()))
        }
        _ => Err(MigrateError::MalformedFilename(file_name.to_string())),
    }
}

/// Split raw migration text into trimmed, non-empty statements
///
/// A statement boundary is a line whose trimmed content is exactly
/// [`STATEMENT_BREAKPOINT`]. Text between boundaries is kept verbatim apart
/// from trimming.
pub fn split_statements(raw: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in raw.split_inclusive('\n') {
        if line.trim() == STATEMENT_BREAKPOINT {
            push_statement(&mut statements, &raw[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    push_statement(&mut statements, &raw[start..]);

    statements
}

fn push_statement(statements: &mut Vec<String>, chunk: &str) {
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        statements.push(chunk.to_string());
    }
}
