//! # direct-migrate
//!
//! Applies a directory of Supabase-style SQL migrations to PostgreSQL,
//! each exactly once and in version order, recording every applied
//! migration in `supabase_migrations.schema_migrations`.
//!
//! ```rust,no_run
//! use direct_migrate::{DatabaseConfig, MigrationConfig, MigrationManager, MigrationRunner};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> direct_migrate::MigrateResult<()> {
//! let manager = MigrationManager::with_config(MigrationConfig::default());
//! let runner = MigrationRunner::connect(manager, &DatabaseConfig::from_env()?).await?;
//! let result = runner.run_migrations(&CancellationToken::new()).await;
//! runner.close().await;
//! println!("applied {} migration(s)", result?.applied_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod migrations;

pub use config::{DatabaseConfig, DATABASE_URL_ENV};
pub use error::{MigrateError, MigrateResult};
pub use migrations::*;
