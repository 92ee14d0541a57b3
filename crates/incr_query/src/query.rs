//! Query trait and related types.
//!
//! Queries are the fundamental unit of computation in the query system.
//! Each query is a pure function from a key to a value, with automatic
//! memoization and dependency tracking.

use crate::context::QueryContext;
use crate::error::{QueryError, QueryResult};
use core::any::type_name;
use core::fmt::Debug;
use core::hash::Hash;

/// Identifies one memoized entry: a query definition plus an interned argument.
///
/// Keys are handles into the owning database's storage. Two keys are equal
/// exactly when they name the same definition and an equal argument, which
/// makes them cheap to copy into dependency lists and the active-frame set.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct QueryKey {
    /// Index of the query definition's table in storage.
    pub(crate) query: u32,
    /// Index of the interned argument within that table.
    pub(crate) slot: u32,
}

impl QueryKey {
    #[inline]
    pub(crate) const fn new(query: u32, slot: u32) -> Self {
        Self { query, slot }
    }
}

/// Trait for all queries in the system.
///
/// A query is a pure function from `Key` to `Value` that:
/// - Is automatically memoized
/// - Tracks its dependencies on other queries
/// - Is re-executed lazily once something it read has changed
///
/// A query that keeps the default [`Query::execute`] has no logic of its
/// own: it is an input, and reading it before a value was assigned with
/// `set` fails with [`QueryError::NoInput`]. A query that overrides
/// `execute` can still be pinned to an explicit value with `set`.
///
/// # Example
///
/// ```
/// use incr_query::{Query, QueryContext, QueryDatabase, QueryResult};
///
/// struct SourceText;
///
/// impl Query for SourceText {
///     type Key = String;
///     type Value = String;
/// }
///
/// struct LineCount;
///
/// impl Query for LineCount {
///     type Key = String;
///     type Value = usize;
///
///     fn execute(ctx: &mut QueryContext<'_>, key: &String) -> QueryResult<usize> {
///         let text = ctx.query::<SourceText>(key.clone())?;
///         Ok(text.lines().count())
///     }
/// }
///
/// let mut db = QueryDatabase::new();
/// db.set::<SourceText>("main.rs".into(), "fn main() {\n}\n".into());
/// assert_eq!(*db.query::<LineCount>("main.rs".into()).unwrap(), 2);
/// ```
pub trait Query: 'static + Sized {
    /// The argument type for this query.
    type Key: Clone + Hash + Eq + Debug + Send + Sync + 'static;

    /// The output value type for this query.
    type Value: Debug + Send + Sync + 'static;

    /// Execute the query to compute its value.
    ///
    /// This is called when:
    /// - The query has never been computed
    /// - The cached result is stale (something it read changed)
    ///
    /// The implementation should use `ctx.query::<OtherQuery>(key)` to
    /// read from other queries, which automatically tracks dependencies.
    fn execute(_ctx: &mut QueryContext<'_>, key: &Self::Key) -> QueryResult<Self::Value> {
        Err(QueryError::NoInput {
            query: Self::name(),
            key: format!("{key:?}"),
        })
    }

    /// Name used in errors, logs and dumps.
    fn name() -> &'static str {
        type_name::<Self>()
    }
}
