//! Core query database implementation.
//!
//! The `QueryDatabase` is the central coordinator for all query execution,
//! memoization, and dependency tracking.

use crate::config::DatabaseConfig;
use crate::context::{DatabaseContext, QueryContext};
use crate::dump::{DatabaseDump, DatabaseStats, EntryDump, EntryKind, QueryDump};
use crate::error::{QueryError, QueryResult};
use crate::query::{Query, QueryKey};
use crate::revision::{Revision, RevisionCounter};
use crate::stack::{ExecutionStack, QueryFrame};
use crate::storage::{Memo, Stamp, Storage};
use log::{debug, trace};
use std::sync::Arc;

/// The central query database.
///
/// This is the main interface for executing queries, storing results,
/// and deciding which cached results are still valid after inputs change.
/// Invalidation is lazy: mutating an input only advances the revision, and
/// stale results are found and recomputed the next time they are read.
#[derive(Default)]
pub struct QueryDatabase {
    /// Current revision counter - incremented on input changes.
    revision: RevisionCounter,

    /// Tables for every query type used so far.
    storage: Storage,

    /// Queries currently being computed.
    stack: ExecutionStack,

    config: DatabaseConfig,
}

impl QueryDatabase {
    /// Create a new query database.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new query database with the given settings.
    #[inline]
    pub fn with_config(config: DatabaseConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[inline]
    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Get the current revision.
    #[inline]
    pub const fn current_revision(&self) -> Revision {
        self.revision.current()
    }

    /// Execute a query, returning the memoized result if still valid.
    ///
    /// This is the main entry point for query execution. It:
    /// 1. Checks if a cached result exists and is still valid
    /// 2. If not, executes the query function
    /// 3. Automatically tracks dependencies during execution
    /// 4. Memoizes the result for future queries
    #[inline]
    pub fn query<Q: Query>(&mut self, key: Q::Key) -> QueryResult<Arc<Q::Value>> {
        self.fetch::<Q>(key)
    }

    /// Execute a query that takes no argument.
    #[inline]
    pub fn query_unit<Q: Query<Key = ()>>(&mut self) -> QueryResult<Arc<Q::Value>> {
        self.fetch::<Q>(())
    }

    /// Assign an explicit value for a query and key, incrementing the revision.
    ///
    /// The revision advances even when the value equals the stored one. If the
    /// query has logic of its own, the value pins it until [`Self::remove`].
    pub fn set<Q: Query>(&mut self, key: Q::Key, value: Q::Value) {
        let revision = self.revision.increment();
        let table = self.storage.table_mut::<Q>();
        let query_key = table.intern(&key);

        match table.get_mut(query_key.slot) {
            Some(Memo::Input {
                value: stored,
                changed_at,
            }) => {
                *stored = Arc::new(value);
                *changed_at = revision;
            }
            _ => table.insert(
                query_key.slot,
                Memo::Input {
                    value: Arc::new(value),
                    changed_at: revision,
                },
            ),
        }

        debug!("Input set: {}({key:?}) -> revision {revision}", Q::name());
    }

    /// Assign an explicit value for a query that takes no argument.
    #[inline]
    pub fn set_unit<Q: Query<Key = ()>>(&mut self, value: Q::Value) {
        self.set::<Q>((), value);
    }

    /// Assign a value unless an equal input is already stored.
    ///
    /// Returns whether the value was written. Skipping an equal value leaves
    /// the revision untouched, so nothing that read the input is re-verified.
    pub fn set_if_changed<Q>(&mut self, key: Q::Key, value: Q::Value) -> bool
    where
        Q: Query,
        Q::Value: PartialEq,
    {
        let unchanged = self
            .storage
            .lookup::<Q>(&key)
            .and_then(|query_key| self.storage.memo::<Q>(query_key))
            .is_some_and(|memo| memo.is_input() && **memo.value() == value);

        if unchanged {
            trace!("Input unchanged: {}({key:?})", Q::name());
            return false;
        }

        self.set::<Q>(key, value);
        true
    }

    /// Clear the stored value for a query and key.
    ///
    /// A pinned derived query reverts to its own logic; an input becomes
    /// unset. Returns whether anything was removed. The revision only advances
    /// when an entry was actually removed.
    pub fn remove<Q: Query>(&mut self, key: &Q::Key) -> bool {
        let Some(query_key) = self.storage.lookup::<Q>(key) else {
            return false;
        };

        let next = Revision::new(self.revision.current().get() + 1);
        let removed = self
            .storage
            .table_mut::<Q>()
            .remove(query_key.slot, next)
            .is_some();

        if removed {
            let revision = self.revision.increment();
            debug!("Removed: {}({key:?}) -> revision {revision}", Q::name());
        }
        removed
    }

    /// Clear the stored value for a query that takes no argument.
    #[inline]
    pub fn remove_unit<Q: Query<Key = ()>>(&mut self) -> bool {
        self.remove::<Q>(&())
    }

    /// Drop all derived results but keep inputs.
    ///
    /// Does not advance the revision: nothing derived survives that could
    /// observe the drop.
    pub fn clear_cache(&mut self) {
        let dropped = self.storage.clear_derived();
        debug!("Cleared {dropped} derived results");
    }

    /// Run a read-only batch of queries.
    pub fn read<T>(&mut self, body: impl FnOnce(&mut QueryContext<'_>) -> T) -> T {
        body(&mut QueryContext::new(self))
    }

    /// Run a batch of queries and input mutations.
    pub fn run<T>(&mut self, body: impl FnOnce(&mut DatabaseContext<'_>) -> T) -> T {
        body(&mut DatabaseContext::new(self))
    }

    /// Snapshot every stored entry and its revision metadata.
    pub fn dump(&self) -> DatabaseDump {
        let queries = self
            .storage
            .tables()
            .map(|table| QueryDump {
                name: table.name(),
                entries: table
                    .entries()
                    .into_iter()
                    .map(|entry| {
                        let (kind, dependencies) = match &entry.stamp {
                            Stamp::Input { .. } => (EntryKind::Input, Vec::new()),
                            Stamp::Derived { dependencies, .. } => (
                                EntryKind::Derived,
                                dependencies
                                    .iter()
                                    .map(|&dependency| self.storage.describe(dependency))
                                    .collect(),
                            ),
                        };
                        EntryDump {
                            key: entry.key,
                            value: entry.value,
                            kind,
                            changed_at: entry.stamp.changed_at(),
                            verified_at: entry.stamp.verified_at(),
                            dependencies,
                        }
                    })
                    .collect(),
            })
            .collect();

        DatabaseDump {
            revision: self.current_revision(),
            queries,
        }
    }

    /// Write [`Self::dump`] to the debug log.
    pub fn log_dump(&self) {
        debug!("{}", self.dump());
    }

    /// Count stored entries.
    pub fn stats(&self) -> DatabaseStats {
        let mut stats = DatabaseStats {
            revision: self.current_revision(),
            ..DatabaseStats::default()
        };
        for table in self.storage.tables() {
            let (inputs, derived) = table.counts();
            stats.queries += 1;
            stats.inputs += inputs;
            stats.derived += derived;
        }
        stats
    }

    /// Read a query on behalf of the innermost active frame, if any.
    pub(crate) fn fetch<Q: Query>(&mut self, key: Q::Key) -> QueryResult<Arc<Q::Value>> {
        let query_key = self.storage.intern::<Q>(&key);

        if self.stack.is_active(query_key) {
            let error = self.cycle_error(query_key);
            debug!("{error}");
            return Err(error);
        }

        self.stack.record_dependency(query_key);

        let cached = self.storage.memo::<Q>(query_key).map(|memo| {
            let verify_from = match memo {
                Memo::Input { .. } => None,
                Memo::Derived { verified_at, .. } => Some(*verified_at),
            };
            (Arc::clone(memo.value()), memo.changed_at(), verify_from)
        });

        if let Some((value, changed_at, verify_from)) = cached {
            let fresh = match verify_from {
                None => true,
                Some(verified_at) => self.verify(query_key, verified_at),
            };

            if fresh {
                trace!("Cache hit for {}: {key:?}", Q::name());
                self.stack.track_revision(changed_at);
                return Ok(value);
            }
        }

        trace!("Cache miss for {}: {key:?}", Q::name());
        self.execute_query::<Q>(&key, query_key)
    }

    /// Execute a query in a new frame and memoize the result.
    fn execute_query<Q: Query>(
        &mut self,
        key: &Q::Key,
        query_key: QueryKey,
    ) -> QueryResult<Arc<Q::Value>> {
        let depth = self.stack.depth();
        if let Some(limit) = self.config.max_query_depth.filter(|&limit| depth >= limit) {
            return Err(QueryError::DepthExceeded {
                limit,
                key: self.storage.describe(query_key),
            });
        }

        let mut guard = FrameGuard::enter(self, query_key);
        let result = Q::execute(&mut guard.context(), key);
        let frame = guard.finish();

        let value = match result {
            Ok(value) => value,
            Err(error) => {
                self.stack.absorb(&frame.dependencies, frame.max_revision);
                return Err(error);
            }
        };

        // Stay newer than a removal of this entry that dependents may not have seen.
        let table = self.storage.table_mut::<Q>();
        let changed_at = frame.max_revision.max(table.removed_at(query_key.slot));

        let value = Arc::new(value);
        table.insert(
            query_key.slot,
            Memo::Derived {
                value: Arc::clone(&value),
                changed_at,
                verified_at: self.revision.current(),
                dependencies: frame.dependencies.as_slice().into(),
            },
        );

        self.stack.absorb(&frame.dependencies, changed_at);
        Ok(value)
    }

    /// Check whether the memo for `key` is unchanged since `as_of`.
    ///
    /// A derived memo is checked against its own dependencies relative to its
    /// `verified_at`, and a positive result is remembered for the rest of the
    /// current revision. Nothing is recomputed here.
    fn verify(&mut self, key: QueryKey, as_of: Revision) -> bool {
        let current = self.revision.current();

        let valid = match self.storage.stamp(key) {
            // Removed after it was read.
            None => false,
            Some(Stamp::Input { changed_at }) => changed_at <= as_of,
            Some(Stamp::Derived {
                changed_at,
                verified_at,
                dependencies,
            }) => {
                if changed_at.is_newer_than(as_of) {
                    false
                } else if verified_at == current {
                    true
                } else {
                    let fresh = dependencies
                        .iter()
                        .all(|&dependency| self.verify(dependency, verified_at));
                    if fresh {
                        self.storage.mark_verified(key, current);
                    }
                    fresh
                }
            }
        };

        trace!(
            "Verified {} as of {as_of}: {}",
            self.storage.describe(key),
            if valid { "fresh" } else { "stale" }
        );
        valid
    }

    fn cycle_error(&self, key: QueryKey) -> QueryError {
        QueryError::Cycle {
            key: self.storage.describe(key),
            stack: self
                .stack
                .keys()
                .map(|active| self.storage.describe(active))
                .collect(),
        }
    }
}

/// A frame pushed for one query execution.
///
/// Dropping the guard unwinds the stack back to where it was on entry, so a
/// panic in query logic cannot leave the key marked active.
struct FrameGuard<'db> {
    db: &'db mut QueryDatabase,
    depth: usize,
}

impl<'db> FrameGuard<'db> {
    fn enter(db: &'db mut QueryDatabase, key: QueryKey) -> Self {
        let depth = db.stack.depth();
        db.stack.push(key);
        Self { db, depth }
    }

    fn context(&mut self) -> QueryContext<'_> {
        QueryContext::new(self.db)
    }

    /// Pop the frame this guard pushed.
    #[allow(
        clippy::expect_used,
        reason = "Frames above the guard's own are popped by their guards before it finishes"
    )]
    fn finish(mut self) -> QueryFrame {
        self.db
            .stack
            .pop()
            .expect("Execution stack lost the frame of a running query")
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        let discarded = self.db.stack.unwind_to(self.depth);
        if discarded > 0 {
            debug!("Discarded {discarded} frames of a query that did not finish");
        }
    }
}
