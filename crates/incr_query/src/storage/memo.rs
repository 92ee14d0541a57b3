//! Stored records for a single query key.

use crate::query::QueryKey;
use crate::revision::Revision;
use std::sync::Arc;

/// The record kept for one query key.
#[derive(Debug)]
pub enum Memo<V> {
    /// A value assigned with `set`. Inputs have no dependencies.
    Input {
        /// The assigned value.
        value: Arc<V>,
        /// Revision of the `set` that produced this value.
        changed_at: Revision,
    },
    /// A value produced by running the query's logic.
    Derived {
        /// The computed value.
        value: Arc<V>,
        /// Newest revision among everything the computation read.
        changed_at: Revision,
        /// Last revision at which the value was confirmed fresh.
        verified_at: Revision,
        /// Keys read while computing, in first-read order.
        dependencies: Arc<[QueryKey]>,
    },
}

impl<V> Memo<V> {
    #[inline]
    pub const fn value(&self) -> &Arc<V> {
        match self {
            Self::Input { value, .. } | Self::Derived { value, .. } => value,
        }
    }

    #[inline]
    pub const fn changed_at(&self) -> Revision {
        match self {
            Self::Input { changed_at, .. } | Self::Derived { changed_at, .. } => *changed_at,
        }
    }

    #[inline]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Input { .. })
    }

    /// Revision metadata without the value.
    pub fn stamp(&self) -> Stamp {
        match self {
            Self::Input { changed_at, .. } => Stamp::Input {
                changed_at: *changed_at,
            },
            Self::Derived {
                changed_at,
                verified_at,
                dependencies,
                ..
            } => Stamp::Derived {
                changed_at: *changed_at,
                verified_at: *verified_at,
                dependencies: Arc::clone(dependencies),
            },
        }
    }
}

/// Type-erased view of a memo's revision metadata.
///
/// Verification walks dependencies of arbitrary query types, so it works on
/// stamps rather than typed memos.
#[derive(Clone, Debug)]
pub enum Stamp {
    Input {
        changed_at: Revision,
    },
    Derived {
        changed_at: Revision,
        verified_at: Revision,
        dependencies: Arc<[QueryKey]>,
    },
}

impl Stamp {
    #[inline]
    pub const fn changed_at(&self) -> Revision {
        match self {
            Self::Input { changed_at } | Self::Derived { changed_at, .. } => *changed_at,
        }
    }

    #[inline]
    pub const fn verified_at(&self) -> Option<Revision> {
        match self {
            Self::Input { .. } => None,
            Self::Derived { verified_at, .. } => Some(*verified_at),
        }
    }
}
