//! Reconciliation of local migrations against the ledger
//!
//! Presence is decided by version alone. A recorded hash that differs from
//! the file's current hash marks the migration as drifted; drifted
//! migrations are never re-applied.

use super::definitions::{Migration, MigrationStatus};
use super::ledger::AppliedVersions;

/// Local migrations whose version is absent from the ledger, in input order
pub fn pending<'a>(local: &'a [Migration], applied: &AppliedVersions) -> Vec<&'a Migration> {
    local
        .iter()
        .filter(|migration| !applied.contains_key(&migration.version))
        .collect()
}

/// Status of every local migration, in input order
pub fn classify<'a>(
    local: &'a [Migration],
    applied: &AppliedVersions,
) -> Vec<(&'a Migration, MigrationStatus)> {
    local
        .iter()
        .map(|migration| {
            let status = match applied.get(&migration.version) {
                None => MigrationStatus::Pending,
                Some(hash) if *hash == migration.content_hash => MigrationStatus::Applied,
                Some(hash) => MigrationStatus::Drifted {
                    recorded_hash: hash.clone(),
                },
            };
            (migration, status)
        })
        .collect()
}
