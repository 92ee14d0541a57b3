//! Capabilities handed to query logic and transaction bodies.
//!
//! A [`QueryContext`] borrows its database mutably for as long as it lives, so
//! it cannot be kept around or used once the call that produced it returns.

use crate::database::QueryDatabase;
use crate::error::QueryResult;
use crate::query::Query;
use crate::revision::Revision;
use core::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Read access to a database from inside a query or a `read` transaction.
///
/// Every query issued through the context is recorded as a dependency of the
/// query currently being computed, if there is one.
pub struct QueryContext<'db> {
    db: &'db mut QueryDatabase,
}

impl<'db> QueryContext<'db> {
    #[inline]
    pub(crate) const fn new(db: &'db mut QueryDatabase) -> Self {
        Self { db }
    }

    /// Run a query for the given key.
    #[inline]
    pub fn query<Q: Query>(&mut self, key: Q::Key) -> QueryResult<Arc<Q::Value>> {
        self.db.fetch::<Q>(key)
    }

    /// Run a query that takes no argument.
    #[inline]
    pub fn query_unit<Q: Query<Key = ()>>(&mut self) -> QueryResult<Arc<Q::Value>> {
        self.db.fetch::<Q>(())
    }

    /// The database's current revision.
    #[inline]
    pub fn current_revision(&self) -> Revision {
        self.db.current_revision()
    }
}

/// Read/write access to a database from inside a `run` transaction.
///
/// Dereferences to [`QueryContext`] for reads.
pub struct DatabaseContext<'db> {
    inner: QueryContext<'db>,
}

impl<'db> DatabaseContext<'db> {
    #[inline]
    pub(crate) const fn new(db: &'db mut QueryDatabase) -> Self {
        Self {
            inner: QueryContext::new(db),
        }
    }

    /// Assign an explicit value for a query and key.
    #[inline]
    pub fn set<Q: Query>(&mut self, key: Q::Key, value: Q::Value) {
        self.inner.db.set::<Q>(key, value);
    }

    /// Assign an explicit value for a query that takes no argument.
    #[inline]
    pub fn set_unit<Q: Query<Key = ()>>(&mut self, value: Q::Value) {
        self.inner.db.set::<Q>((), value);
    }

    /// Assign a value unless an equal input is already stored.
    #[inline]
    pub fn set_if_changed<Q>(&mut self, key: Q::Key, value: Q::Value) -> bool
    where
        Q: Query,
        Q::Value: PartialEq,
    {
        self.inner.db.set_if_changed::<Q>(key, value)
    }

    /// Clear the stored value for a query and key.
    #[inline]
    pub fn remove<Q: Query>(&mut self, key: &Q::Key) -> bool {
        self.inner.db.remove::<Q>(key)
    }

    /// Clear the stored value for a query that takes no argument.
    #[inline]
    pub fn remove_unit<Q: Query<Key = ()>>(&mut self) -> bool {
        self.inner.db.remove::<Q>(&())
    }
}

impl<'db> Deref for DatabaseContext<'db> {
    type Target = QueryContext<'db>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for DatabaseContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
