//! Migration Runner - Executes migrations against the database
//!
//! Each pending migration runs in its own transaction together with its
//! ledger insert. The first failure rolls back the current migration and
//! ends the run; migrations committed earlier stay applied.

use std::future::Future;
use std::time::Instant;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::definitions::{Migration, MigrationRunResult, MigrationStatus};
use super::ledger::Ledger;
use super::manager::MigrationManager;
use super::reconcile::classify;
use crate::config::DatabaseConfig;
use crate::error::{MigrateError, MigrateResult};

/// Migration runner that executes migrations against a database
pub struct MigrationRunner {
    manager: MigrationManager,
    ledger: Ledger,
    pool: PgPool,
}

impl MigrationRunner {
    /// Create a new migration runner
    pub fn new(manager: MigrationManager, pool: PgPool) -> Self {
        let ledger = Ledger::new(manager.config());
        Self {
            manager,
            ledger,
            pool,
        }
    }

    /// Create a new migration runner holding a single database connection
    pub async fn connect(manager: MigrationManager, database: &DatabaseConfig) -> MigrateResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&database.url)
            .await
            .map_err(MigrateError::Connection)?;

        Ok(Self::new(manager, pool))
    }

    /// Get the database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the migration manager
    pub fn manager(&self) -> &MigrationManager {
        &self.manager
    }

    /// Get the ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Run all pending migrations in version order
    pub async fn run_migrations(&self, cancel: &CancellationToken) -> MigrateResult<MigrationRunResult> {
        let start_time = Instant::now();
        info!("Loading database state...");

        // Parse every local file before touching the database
        let local = self.manager.load_migrations()?;

        cancellable(cancel, self.ledger.ensure_ledger(&self.pool)).await??;
        let applied = cancellable(cancel, self.ledger.applied_versions(&self.pool)).await??;

        info!("Found {} local migrations.", local.len());

        let mut result = MigrationRunResult {
            discovered: local.len(),
            ..Default::default()
        };

        for (migration, status) in classify(&local, &applied) {
            match status {
                MigrationStatus::Applied => {
                    info!("Migration already applied: {} ({})", migration.version, migration.name);
                    result.skipped.push(migration.version.clone());
                }
                MigrationStatus::Drifted { recorded_hash } => {
                    info!("Migration already applied: {} ({})", migration.version, migration.name);
                    warn!(
                        "Migration {} changed since it was applied (recorded hash {}, current hash {})",
                        migration.version, recorded_hash, migration.content_hash
                    );
                    result.skipped.push(migration.version.clone());
                    result.drifted.push(migration.version.clone());
                }
                MigrationStatus::Pending => {
                    info!("Applying pending migration: {} ({})", migration.version, migration.name);
                    self.apply_migration(migration, cancel).await?;
                    info!("Migration {} applied successfully.", migration.version);
                    result.applied.push(migration.version.clone());
                }
            }
        }

        info!("All pending migrations have been applied.");
        result.execution_time_ms = start_time.elapsed().as_millis();
        Ok(result)
    }

    /// Status of every local migration without applying anything
    pub async fn migration_status(
        &self,
        cancel: &CancellationToken,
    ) -> MigrateResult<Vec<(Migration, MigrationStatus)>> {
        let local = self.manager.load_migrations()?;

        cancellable(cancel, self.ledger.ensure_ledger(&self.pool)).await??;
        let applied = cancellable(cancel, self.ledger.applied_versions(&self.pool)).await??;

        Ok(classify(&local, &applied)
            .into_iter()
            .map(|(migration, status)| (migration.clone(), status))
            .collect())
    }

    /// Apply a single migration: its statements and ledger row commit together or not at all
    pub async fn apply_migration(&self, migration: &Migration, cancel: &CancellationToken) -> MigrateResult<()> {
        let version = &migration.version;

        let mut transaction = cancellable(cancel, self.pool.begin())
            .await?
            .map_err(|source| MigrateError::Transaction {
                version: version.clone(),
                source,
            })?;

        for (index, statement) in migration.statements.iter().enumerate() {
            debug!("Executing statement {} of migration {}", index + 1, version);

            // A dropped transaction is rolled back by the driver
            let executed = cancellable(cancel, (&mut *transaction).execute(statement.as_str())).await?;
            if let Err(source) = executed {
                error!("Error executing statement: {}", source);
                if let Err(e) = transaction.rollback().await {
                    warn!("Failed to roll back migration {}: {}", version, e);
                }
                return Err(MigrateError::Statement {
                    version: version.clone(),
                    index: index + 1,
                    source,
                });
            }
        }

        let recorded = cancellable(cancel, self.ledger.record(&mut *transaction, migration)).await?;
        if let Err(source) = recorded {
            if let Err(e) = transaction.rollback().await {
                warn!("Failed to roll back migration {}: {}", version, e);
            }
            let unique_violation = source
                .as_database_error()
                .map_or(false, |db_error| db_error.is_unique_violation());
            return Err(if unique_violation {
                MigrateError::AlreadyRecorded {
                    version: version.clone(),
                }
            } else {
                MigrateError::Record {
                    version: version.clone(),
                    source,
                }
            });
        }

        cancellable(cancel, transaction.commit())
            .await?
            .map_err(|source| MigrateError::Commit {
                version: version.clone(),
                source,
            })
    }
}

/// Race `future` against cancellation of the run
async fn cancellable<F: Future>(cancel: &CancellationToken, future: F) -> MigrateResult<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MigrateError::Cancelled),
        output = future => Ok(output),
    }
}
