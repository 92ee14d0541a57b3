//! Storage backends for query results.
//!
//! This module provides the storage infrastructure for:
//! - Per-query tables of input and derived memos
//! - Type-erased access to revision metadata for verification

mod memo;
mod memoized;

pub use memo::{Memo, Stamp};
pub use memoized::{ErasedEntry, MemoizedStorage, QueryStorage};

use crate::query::{Query, QueryKey};
use crate::revision::Revision;
use core::any::TypeId;
use rustc_hash::FxHashMap;

/// Every query table owned by one database.
///
/// Tables are kept in registration order so diagnostics list queries in the
/// order they were first used.
#[derive(Default)]
pub struct Storage {
    tables: Vec<Box<dyn QueryStorage>>,
    by_type: FxHashMap<TypeId, u32>,
}

impl Storage {
    /// Get or create the table for a query type.
    #[allow(
        clippy::expect_used,
        reason = "Tables are registered under the TypeId of their own query type"
    )]
    pub fn table_mut<Q: Query>(&mut self) -> &mut MemoizedStorage<Q> {
        let index = match self.by_type.get(&TypeId::of::<Q>()) {
            Some(&index) => index,
            None => {
                let index = self.tables.len() as u32;
                self.tables.push(Box::new(MemoizedStorage::<Q>::new(index)));
                self.by_type.insert(TypeId::of::<Q>(), index);
                index
            }
        };

        self.tables[index as usize]
            .as_any_mut()
            .downcast_mut::<MemoizedStorage<Q>>()
            .expect("Type mismatch in query storage")
    }

    /// Get the table for a query type if it was ever used.
    pub fn table<Q: Query>(&self) -> Option<&MemoizedStorage<Q>> {
        let index = *self.by_type.get(&TypeId::of::<Q>())?;
        self.tables
            .get(index as usize)?
            .as_any()
            .downcast_ref::<MemoizedStorage<Q>>()
    }

    /// Key for an argument, interning it on first use.
    #[inline]
    pub fn intern<Q: Query>(&mut self, key: &Q::Key) -> QueryKey {
        self.table_mut::<Q>().intern(key)
    }

    /// Key for an argument if it was ever interned.
    #[inline]
    pub fn lookup<Q: Query>(&self, key: &Q::Key) -> Option<QueryKey> {
        self.table::<Q>()?.lookup(key)
    }

    /// Typed memo for a key of query `Q`.
    #[inline]
    pub fn memo<Q: Query>(&self, key: QueryKey) -> Option<&Memo<Q::Value>> {
        self.table::<Q>()?.get(key.slot)
    }

    /// Revision metadata for a key of any query type.
    #[inline]
    pub fn stamp(&self, key: QueryKey) -> Option<Stamp> {
        self.tables.get(key.query as usize)?.stamp(key.slot)
    }

    #[inline]
    pub fn mark_verified(&mut self, key: QueryKey, revision: Revision) {
        if let Some(table) = self.tables.get_mut(key.query as usize) {
            table.mark_verified(key.slot, revision);
        }
    }

    /// Render a key as `name(argument)`.
    pub fn describe(&self, key: QueryKey) -> String {
        self.tables.get(key.query as usize).map_or_else(
            || format!("<query {}>(<slot {}>)", key.query, key.slot),
            |table| table.describe_key(key.slot),
        )
    }

    /// Drop every derived memo. Returns how many were dropped.
    pub fn clear_derived(&mut self) -> usize {
        self.tables
            .iter_mut()
            .map(|table| table.clear_derived())
            .sum()
    }

    /// All tables in registration order.
    #[inline]
    pub fn tables(&self) -> impl Iterator<Item = &dyn QueryStorage> {
        self.tables.iter().map(|table| &**table)
    }
}
