use direct_migrate::{MigrateResult, MigrationRunner, MigrationStatus};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// One line of `--status --json` output
#[derive(Serialize)]
struct StatusRow<'a> {
    version: &'a str,
    name: &'a str,
    hash: &'a str,
    #[serde(flatten)]
    status: &'a MigrationStatus,
}

/// Apply every pending migration
pub async fn run(runner: &MigrationRunner, cancel: &CancellationToken, json: bool) -> MigrateResult<()> {
    let result = runner.run_migrations(cancel).await?;

    if json {
        print_json(&result);
    }
    Ok(())
}

/// Report applied, pending and drifted migrations without applying any
pub async fn status(runner: &MigrationRunner, cancel: &CancellationToken, json: bool) -> MigrateResult<()> {
    let statuses = runner.migration_status(cancel).await?;

    if json {
        let rows: Vec<StatusRow> = statuses
            .iter()
            .map(|(migration, status)| StatusRow {
                version: &migration.version,
                name: &migration.name,
                hash: &migration.content_hash,
                status,
            })
            .collect();
        print_json(&rows);
        return Ok(());
    }

    println!("Migration Status:");
    println!("================");

    if statuses.is_empty() {
        println!("No migrations found");
        return Ok(());
    }

    for (migration, status) in &statuses {
        let marker = match status {
            MigrationStatus::Applied => "✅",
            MigrationStatus::Pending => "⏳",
            MigrationStatus::Drifted { .. } => "⚠️",
        };
        println!("  {} {} ({})", marker, migration.version, migration.name);
    }
    println!("\n✅ = Applied  ⏳ = Pending  ⚠️ = Changed since applied");

    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(out) => println!("{}", out),
        Err(e) => tracing::error!("Failed to serialize output: {}", e),
    }
}
