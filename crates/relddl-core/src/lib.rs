//! Schema-mutation engine (`spec.md` §4.2-§4.7): `CREATE`/`ALTER TABLE`
//! controller, attribute/constraint inheritance merge, partition manager,
//! and the `ON COMMIT` registry.
//!
//! `relddl-transform` resolves raw statements into catalog-id-addressed
//! plans without touching storage; this crate is the only one that
//! actually executes them against a [`relddl_catalog::Catalog`].

pub mod altered_table_info;
pub mod controller;
pub mod define_relation;
pub mod error;
pub mod inheritance;
pub mod locks;
pub mod oid_space;
pub mod oncommit_registry;
pub mod partition_manager;
pub mod protected_columns;
pub mod subcommands;

pub use controller::{drop_tables, run_batch, Propagation};
pub use define_relation::define_relation;
pub use error::{CoreError, Result};
pub use locks::{required_lock_level, LockManager, LockMode};
pub use oncommit_registry::OnCommitRegistry;
