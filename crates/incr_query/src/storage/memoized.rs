//! Memoized storage for query results.
//!
//! Each query type gets one table. Arguments are interned into slots so the
//! rest of the engine can refer to an entry with a copyable [`QueryKey`].

use crate::query::{Query, QueryKey};
use crate::revision::Revision;
use crate::storage::memo::{Memo, Stamp};
use core::any::Any;
use rustc_hash::FxHashMap;

/// Type-erased trait for query storage.
///
/// This allows the database to keep tables of different query types in a
/// single collection and to verify dependencies without knowing their types.
pub trait QueryStorage: Send + 'static {
    /// Get the storage as a dynamic reference.
    fn as_any(&self) -> &dyn Any;

    /// Get the storage as a mutable dynamic reference.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Name of the query this table belongs to.
    fn name(&self) -> &'static str;

    /// Revision metadata of the entry in `slot`, if it holds a value.
    fn stamp(&self, slot: u32) -> Option<Stamp>;

    /// Record that the derived entry in `slot` was confirmed fresh.
    fn mark_verified(&mut self, slot: u32, revision: Revision);

    /// Render the argument interned in `slot`.
    fn describe_key(&self, slot: u32) -> String;

    /// Drop every derived entry, keeping inputs. Returns how many were dropped.
    fn clear_derived(&mut self) -> usize;

    /// Snapshot of all occupied entries, in interning order.
    fn entries(&self) -> Vec<ErasedEntry>;

    /// Number of (input, derived) entries currently stored.
    fn counts(&self) -> (usize, usize);
}

/// An occupied entry with its argument and value rendered for diagnostics.
#[derive(Debug)]
pub struct ErasedEntry {
    pub key: String,
    pub value: String,
    pub stamp: Stamp,
}

#[derive(Debug)]
struct Entry<V> {
    memo: Option<Memo<V>>,
    /// Revision of the last `remove` of this entry.
    removed_at: Revision,
}

/// Strongly-typed storage for a specific query type.
///
/// Interned arguments keep their slot for the life of the table. Neither
/// `remove` nor clearing derived results releases a slot, so memory grows with
/// the number of distinct arguments ever seen.
pub struct MemoizedStorage<Q: Query> {
    /// Index of this table within storage.
    query: u32,
    /// Interned arguments, indexed by slot.
    keys: Vec<Q::Key>,
    /// Argument to slot lookup.
    slots: FxHashMap<Q::Key, u32>,
    /// Entries, indexed by slot.
    entries: Vec<Entry<Q::Value>>,
}

impl<Q: Query> MemoizedStorage<Q> {
    /// Create a new empty table registered under `query`.
    #[inline]
    pub fn new(query: u32) -> Self {
        Self {
            query,
            keys: Vec::new(),
            slots: FxHashMap::default(),
            entries: Vec::new(),
        }
    }

    /// Key for `key`, interning the argument on first use.
    pub fn intern(&mut self, key: &Q::Key) -> QueryKey {
        if let Some(&slot) = self.slots.get(key) {
            return QueryKey::new(self.query, slot);
        }

        let slot = self.keys.len() as u32;
        self.keys.push(key.clone());
        self.slots.insert(key.clone(), slot);
        self.entries.push(Entry {
            memo: None,
            removed_at: Revision::INITIAL,
        });
        QueryKey::new(self.query, slot)
    }

    /// Key for `key` if the argument was interned before.
    #[inline]
    pub fn lookup(&self, key: &Q::Key) -> Option<QueryKey> {
        self.slots
            .get(key)
            .map(|&slot| QueryKey::new(self.query, slot))
    }

    /// Get the stored memo for a slot.
    #[inline]
    pub fn get(&self, slot: u32) -> Option<&Memo<Q::Value>> {
        self.entries
            .get(slot as usize)
            .and_then(|entry| entry.memo.as_ref())
    }

    /// Get the stored memo for a slot mutably.
    #[inline]
    pub fn get_mut(&mut self, slot: u32) -> Option<&mut Memo<Q::Value>> {
        self.entries
            .get_mut(slot as usize)
            .and_then(|entry| entry.memo.as_mut())
    }

    /// Store a memo, replacing whatever the slot held.
    #[inline]
    pub fn insert(&mut self, slot: u32, memo: Memo<Q::Value>) {
        if let Some(entry) = self.entries.get_mut(slot as usize) {
            entry.memo = Some(memo);
        }
    }

    /// Remove the memo in a slot, remembering the revision of the removal.
    pub fn remove(&mut self, slot: u32, revision: Revision) -> Option<Memo<Q::Value>> {
        let entry = self.entries.get_mut(slot as usize)?;
        let removed = entry.memo.take();
        if removed.is_some() {
            entry.removed_at = revision;
        }
        removed
    }

    /// Revision of the last removal in a slot, or the initial revision.
    #[inline]
    pub fn removed_at(&self, slot: u32) -> Revision {
        self.entries
            .get(slot as usize)
            .map_or(Revision::INITIAL, |entry| entry.removed_at)
    }
}

impl<Q: Query> QueryStorage for MemoizedStorage<Q> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &'static str {
        Q::name()
    }

    fn stamp(&self, slot: u32) -> Option<Stamp> {
        self.get(slot).map(Memo::stamp)
    }

    fn mark_verified(&mut self, slot: u32, revision: Revision) {
        if let Some(Memo::Derived { verified_at, .. }) = self.get_mut(slot) {
            *verified_at = revision;
        }
    }

    fn describe_key(&self, slot: u32) -> String {
        match self.keys.get(slot as usize) {
            Some(key) => format!("{}({key:?})", Q::name()),
            None => format!("{}(<slot {slot}>)", Q::name()),
        }
    }

    fn clear_derived(&mut self) -> usize {
        let mut dropped = 0;
        for entry in &mut self.entries {
            if entry.memo.as_ref().is_some_and(|memo| !memo.is_input()) {
                entry.memo = None;
                dropped += 1;
            }
        }
        dropped
    }

    fn entries(&self) -> Vec<ErasedEntry> {
        self.keys
            .iter()
            .zip(&self.entries)
            .filter_map(|(key, entry)| {
                entry.memo.as_ref().map(|memo| ErasedEntry {
                    key: format!("{key:?}"),
                    value: format!("{:?}", memo.value()),
                    stamp: memo.stamp(),
                })
            })
            .collect()
    }

    fn counts(&self) -> (usize, usize) {
        self.entries
            .iter()
            .filter_map(|entry| entry.memo.as_ref())
            .fold((0, 0), |(inputs, derived), memo| {
                if memo.is_input() {
                    (inputs + 1, derived)
                } else {
                    (inputs, derived + 1)
                }
            })
    }
}
