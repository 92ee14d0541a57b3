//! Revision-tracked incremental query database.
//!
//! This crate provides a Salsa/Adapton-style query system with:
//! - Automatic memoization of query results
//! - Dependency tracking between queries
//! - Lazy, pull-based invalidation (only recompute what changed)
//! - Cycle detection with a report of the active query stack
//!
//! # Model
//!
//! Every assignment of an input advances a single revision counter. Each
//! stored result remembers the revision at which it last changed, and derived
//! results also remember when they were last confirmed fresh:
//!
//! ```text
//! set(input)          -> revision r+1, input.changed_at = r+1
//! query(derived)      -> cached and verified at current revision? return it
//!                     -> otherwise walk its dependencies relative to
//!                        verified_at; recompute only if one of them changed
//! ```
//!
//! A derived result's `changed_at` is inherited from the newest value it read,
//! so a recomputation that reads only old values does not force its own
//! dependents to recompute.
//!
//! # Example
//!
//! ```
//! use incr_query::{Query, QueryContext, QueryDatabase, QueryResult};
//!
//! struct Width;
//!
//! impl Query for Width {
//!     type Key = ();
//!     type Value = u32;
//! }
//!
//! struct DoubledWidth;
//!
//! impl Query for DoubledWidth {
//!     type Key = ();
//!     type Value = u32;
//!
//!     fn execute(ctx: &mut QueryContext<'_>, _key: &()) -> QueryResult<u32> {
//!         Ok(*ctx.query_unit::<Width>()? * 2)
//!     }
//! }
//!
//! let mut db = QueryDatabase::new();
//! db.set_unit::<Width>(5);
//! assert_eq!(*db.query_unit::<DoubledWidth>().unwrap(), 10);
//!
//! db.set_unit::<Width>(100);
//! assert_eq!(*db.query_unit::<DoubledWidth>().unwrap(), 200);
//! ```

#![allow(
    clippy::module_name_repetitions,
    reason = "Query types like QueryDatabase are clearer than just Database"
)]
#![allow(clippy::missing_errors_doc, reason = "Errors are documented on QueryError")]

mod config;
mod context;
mod database;
mod dump;
mod error;
mod query;
mod revision;
mod shared;
mod stack;
mod storage;

// Re-exports
pub use config::DatabaseConfig;
pub use context::{DatabaseContext, QueryContext};
pub use database::QueryDatabase;
pub use dump::{DatabaseDump, DatabaseStats, EntryDump, EntryKind, QueryDump};
pub use error::{QueryError, QueryResult};
pub use query::{Query, QueryKey};
pub use revision::{Revision, RevisionCounter};
pub use shared::SharedQueryDatabase;
