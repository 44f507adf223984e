//! Migration System
//!
//! Loading, reconciliation and transactional application of
//! `{version}_{name}.sql` migrations.

pub mod array;
pub mod definitions;
pub mod hash;
pub mod ledger;
pub mod manager;
pub mod reconcile;
pub mod runner;

pub use array::encode_text_array;
pub use definitions::*;
pub use hash::content_hash;
pub use ledger::{AppliedVersions, Ledger};
pub use manager::{parse_filename, split_statements, MigrationManager, STATEMENT_BREAKPOINT};
pub use reconcile::{classify, pending};
pub use runner::MigrationRunner;
