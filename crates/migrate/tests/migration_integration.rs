//! Database integration tests for the migration runner.
//!
//! These run against the PostgreSQL server in `TEST_DATABASE_URL` and are
//! skipped when it is not set. Every test works in its own schemas.

use std::fs;

use direct_migrate::{
    content_hash, MigrateError, Migration, MigrationConfig, MigrationManager, MigrationRunner,
    MigrationStatus,
};
use sqlx::PgPool;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct TestContext {
    pool: PgPool,
    dir: TempDir,
    ledger_schema: String,
}

impl TestContext {
    /// Fresh ledger schema `{prefix}_ledger` and data schema `{prefix}`
    async fn new(prefix: &str) -> Option<Self> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.unwrap();

        let ledger_schema = format!("{}_ledger", prefix);
        for schema in [prefix, ledger_schema.as_str()] {
            sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema))
                .execute(&pool)
                .await
                .unwrap();
        }
        sqlx::query(&format!("CREATE SCHEMA {}", prefix))
            .execute(&pool)
            .await
            .unwrap();

        Some(Self {
            pool,
            dir: TempDir::new().unwrap(),
            ledger_schema,
        })
    }

    fn write(&self, file_name: &str, content: &str) {
        fs::write(self.dir.path().join(file_name), content).unwrap();
    }

    fn runner(&self) -> MigrationRunner {
        let config = MigrationConfig {
            ledger_schema: self.ledger_schema.clone(),
            ..MigrationConfig::with_dir(self.dir.path())
        };
        MigrationRunner::new(MigrationManager::with_config(config), self.pool.clone())
    }

    async fn table_exists(&self, qualified: &str) -> bool {
        sqlx::query_scalar::<_, bool>("SELECT to_regclass($1) IS NOT NULL")
            .bind(qualified)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    async fn ledger_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {}.schema_migrations",
            self.ledger_schema
        ))
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }
}

#[tokio::test]
async fn test_empty_directory_applies_nothing() {
    let Some(ctx) = TestContext::new("it_empty").await else {
        return;
    };

    let result = ctx.runner().run_migrations(&CancellationToken::new()).await.unwrap();
    assert_eq!(result.discovered, 0);
    assert_eq!(result.applied_count(), 0);
    assert_eq!(ctx.ledger_count().await, 0);
}

#[tokio::test]
async fn test_apply_then_rerun() {
    let Some(ctx) = TestContext::new("it_apply").await else {
        return;
    };
    let raw = "CREATE TABLE it_apply.users (id int);\n\
               -- statement-breakpoint\n\
               INSERT INTO it_apply.users VALUES (1), (2);\n";
    ctx.write("20240101000000_create_users.sql", raw);

    let runner = ctx.runner();
    let result = runner.run_migrations(&CancellationToken::new()).await.unwrap();
    assert_eq!(result.applied, vec!["20240101000000"]);

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM it_apply.users")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(users, 2);

    let entries = runner.ledger().applied_entries(&ctx.pool).await.unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.version, "20240101000000");
    assert_eq!(entry.name, "create_users");
    assert_eq!(entry.hash, content_hash(raw));
    assert_eq!(entry.statements.len(), 2);
    assert_eq!(entry.created_by.as_deref(), Some("supabase-direct-migrate"));
    assert!(entry.created_at.is_some());
    assert!(entry.idempotency_key.is_none());

    // Second run sees the ledger row and executes nothing
    let result = runner.run_migrations(&CancellationToken::new()).await.unwrap();
    assert_eq!(result.applied_count(), 0);
    assert_eq!(result.skipped, vec!["20240101000000"]);
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM it_apply.users")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(users, 2);
    assert_eq!(ctx.ledger_count().await, 1);
}

#[tokio::test]
async fn test_failed_statement_rolls_back_and_stops() {
    let Some(ctx) = TestContext::new("it_fail").await else {
        return;
    };
    ctx.write("20240101000000_ok.sql", "CREATE TABLE it_fail.before (id int);");
    ctx.write(
        "20240102000000_broken.sql",
        "CREATE TABLE it_fail.first (id int);\n-- statement-breakpoint\nCREATE TABLE it_fail.second (id int",
    );
    ctx.write("20240103000000_after.sql", "CREATE TABLE it_fail.after (id int);");

    let err = ctx
        .runner()
        .run_migrations(&CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        MigrateError::Statement { version, index, .. } => {
            assert_eq!(version, "20240102000000");
            assert_eq!(index, 2);
        }
        other => panic!("expected statement error, got {:?}", other),
    }

    assert!(ctx.table_exists("it_fail.before").await);
    assert!(!ctx.table_exists("it_fail.first").await);
    assert!(!ctx.table_exists("it_fail.after").await);
    assert_eq!(ctx.ledger_count().await, 1);
}

#[tokio::test]
async fn test_statements_round_trip_through_ledger() {
    let Some(ctx) = TestContext::new("it_array").await else {
        return;
    };
    let raw = "CREATE TABLE it_array.notes (body text);\n\
               -- statement-breakpoint\n\
               INSERT INTO it_array.notes VALUES ('say \"hi\"'), ('C:\\temp\\{x}');\n";
    ctx.write("20240101000000_notes.sql", raw);

    let runner = ctx.runner();
    runner.run_migrations(&CancellationToken::new()).await.unwrap();

    let local = runner.manager().load_migrations().unwrap();
    let entries = runner.ledger().applied_entries(&ctx.pool).await.unwrap();
    assert_eq!(entries[0].statements, local[0].statements);
    assert!(entries[0].statements[1].contains(r"C:\temp\{x}"));
}

#[tokio::test]
async fn test_concurrent_ledger_insert_is_fatal() {
    let Some(ctx) = TestContext::new("it_race").await else {
        return;
    };
    ctx.write("20240101000000_first.sql", "SELECT 1;");
    let runner = ctx.runner();
    runner.run_migrations(&CancellationToken::new()).await.unwrap();

    // Another run that still believes the version is pending
    let raw = "CREATE TABLE it_race.late (id int);";
    let stale = Migration {
        version: "20240101000000".to_string(),
        name: "first".to_string(),
        raw_content: raw.to_string(),
        statements: vec![raw.to_string()],
        content_hash: content_hash(raw),
    };
    let err = runner
        .apply_migration(&stale, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::AlreadyRecorded { ref version } if version == "20240101000000"));
    assert!(!ctx.table_exists("it_race.late").await);
}

#[tokio::test]
async fn test_status_reports_drift() {
    let Some(ctx) = TestContext::new("it_drift").await else {
        return;
    };
    ctx.write("20240101000000_a.sql", "CREATE TABLE it_drift.a (id int);");
    let runner = ctx.runner();
    runner.run_migrations(&CancellationToken::new()).await.unwrap();

    ctx.write("20240101000000_a.sql", "CREATE TABLE it_drift.a (id bigint);");
    ctx.write("20240102000000_b.sql", "CREATE TABLE it_drift.b (id int);");

    let statuses = runner.migration_status(&CancellationToken::new()).await.unwrap();
    assert!(matches!(statuses[0].1, MigrationStatus::Drifted { .. }));
    assert_eq!(statuses[1].1, MigrationStatus::Pending);

    let result = runner.run_migrations(&CancellationToken::new()).await.unwrap();
    assert_eq!(result.drifted, vec!["20240101000000"]);
    assert_eq!(result.applied, vec!["20240102000000"]);
}

#[tokio::test]
async fn test_cancelled_run_applies_nothing() {
    let Some(ctx) = TestContext::new("it_cancel").await else {
        return;
    };
    ctx.write("20240101000000_a.sql", "CREATE TABLE it_cancel.a (id int);");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = ctx.runner().run_migrations(&cancel).await.unwrap_err();
    assert!(matches!(err, MigrateError::Cancelled));
    assert!(!ctx.table_exists("it_cancel.a").await);
}
