//! Migration ledger - the persisted record of applied migrations
//!
//! The table layout matches the Supabase CLI's
//! `supabase_migrations.schema_migrations` so either tool can read what the
//! other wrote.

use std::collections::BTreeMap;

use sqlx::{PgConnection, PgPool, Row};
use tracing::debug;

use super::array::encode_text_array;
use super::definitions::{LedgerEntry, Migration, MigrationConfig};
use crate::error::{MigrateError, MigrateResult};

/// Applied versions mapped to their recorded hash
pub type AppliedVersions = BTreeMap<String, String>;

/// SQL access to the ledger table
#[derive(Debug, Clone)]
pub struct Ledger {
    schema: String,
    table: String,
    created_by: String,
}

impl Ledger {
    pub fn new(config: &MigrationConfig) -> Self {
        Self {
            schema: config.ledger_schema.clone(),
            table: config.ledger_table.clone(),
            created_by: config.created_by.clone(),
        }
    }

    /// Schema-qualified, quoted table name
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }

    /// Create the ledger schema and table if they do not exist
    pub async fn ensure_ledger(&self, pool: &PgPool) -> MigrateResult<()> {
        sqlx::query(&self.create_schema_sql())
            .execute(pool)
            .await
            .map_err(MigrateError::Provisioning)?;
        sqlx::query(&self.create_table_sql())
            .execute(pool)
            .await
            .map_err(MigrateError::Provisioning)?;

        debug!("Ledger table {} is ready", self.qualified_table());
        Ok(())
    }

    /// All ledger rows, ordered by version
    pub async fn applied_entries(&self, pool: &PgPool) -> MigrateResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(&self.select_entries_sql())
            .fetch_all(pool)
            .await
            .map_err(MigrateError::Ledger)?;

        rows.iter()
            .map(|row| -> Result<LedgerEntry, sqlx::Error> {
                Ok(LedgerEntry {
                    version: row.try_get("version")?,
                    name: row.try_get("name")?,
                    hash: row.try_get("hash")?,
                    statements: row.try_get("statements")?,
                    created_at: row.try_get("created_at")?,
                    created_by: row.try_get("created_by")?,
                    idempotency_key: row.try_get("idempotency_key")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(MigrateError::Ledger)
    }

    /// Applied versions with their recorded hashes
    pub async fn applied_versions(&self, pool: &PgPool) -> MigrateResult<AppliedVersions> {
        let entries = self.applied_entries(pool).await?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.version, entry.hash))
            .collect())
    }

    /// Insert the ledger row for `migration` on the caller's transaction
    pub async fn record(
        &self,
        conn: &mut PgConnection,
        migration: &Migration,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(&self.insert_entry_sql())
            .bind(&migration.version)
            .bind(&migration.name)
            .bind(&migration.content_hash)
            .bind(encode_text_array(&migration.statements))
            .bind(&self.created_by)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// SQL to create the ledger schema
    pub fn create_schema_sql(&self) -> String {
        format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(&self.schema))
    }

    /// SQL to create the ledger table
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                version TEXT PRIMARY KEY,\n    \
                name TEXT NOT NULL,\n    \
                hash TEXT NOT NULL,\n    \
                statements TEXT[] NOT NULL,\n    \
                created_at TIMESTAMPTZ DEFAULT NOW(),\n    \
                created_by TEXT,\n    \
                idempotency_key TEXT\n\
            )",
            self.qualified_table()
        )
    }

    /// SQL to read every ledger row
    pub fn select_entries_sql(&self) -> String {
        format!(
            "SELECT version, name, hash, statements, created_at, created_by, idempotency_key \
             FROM {} ORDER BY version",
            self.qualified_table()
        )
    }

    /// SQL to record a migration as applied
    pub fn insert_entry_sql(&self) -> String {
        format!(
            "INSERT INTO {} (version, name, hash, statements, created_by, idempotency_key) \
             VALUES ($1, $2, $3, $4::text[], $5, NULL)",
            self.qualified_table()
        )
    }
}

/// Quote a PostgreSQL identifier
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
