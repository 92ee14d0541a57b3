//! A lock-serialized database handle that can be shared across threads.
//!
//! Evaluation stays single-threaded: every operation takes the one lock for
//! its whole duration, so concurrent callers simply queue up.

use crate::config::DatabaseConfig;
use crate::context::{DatabaseContext, QueryContext};
use crate::database::QueryDatabase;
use crate::dump::DatabaseDump;
use crate::error::QueryResult;
use crate::query::Query;
use crate::revision::Revision;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to one [`QueryDatabase`] behind a mutex.
///
/// The lock is not re-entrant: query logic receives a [`QueryContext`] and
/// must use it rather than calling back into the handle.
#[derive(Clone, Default)]
pub struct SharedQueryDatabase {
    inner: Arc<Mutex<QueryDatabase>>,
}

impl SharedQueryDatabase {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_config(config: DatabaseConfig) -> Self {
        Self::from(QueryDatabase::with_config(config))
    }

    /// Run a read-only batch of queries while holding the lock.
    pub fn read<T>(&self, body: impl FnOnce(&mut QueryContext<'_>) -> T) -> T {
        self.inner.lock().read(body)
    }

    /// Run a batch of queries and input mutations while holding the lock.
    pub fn run<T>(&self, body: impl FnOnce(&mut DatabaseContext<'_>) -> T) -> T {
        self.inner.lock().run(body)
    }

    #[inline]
    pub fn query<Q: Query>(&self, key: Q::Key) -> QueryResult<Arc<Q::Value>> {
        self.inner.lock().query::<Q>(key)
    }

    #[inline]
    pub fn set<Q: Query>(&self, key: Q::Key, value: Q::Value) {
        self.inner.lock().set::<Q>(key, value);
    }

    #[inline]
    pub fn remove<Q: Query>(&self, key: &Q::Key) -> bool {
        self.inner.lock().remove::<Q>(key)
    }

    #[inline]
    pub fn current_revision(&self) -> Revision {
        self.inner.lock().current_revision()
    }

    pub fn dump(&self) -> DatabaseDump {
        self.inner.lock().dump()
    }
}

impl From<QueryDatabase> for SharedQueryDatabase {
    fn from(db: QueryDatabase) -> Self {
        Self {
            inner: Arc::new(Mutex::new(db)),
        }
    }
}
