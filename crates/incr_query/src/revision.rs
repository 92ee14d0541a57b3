//! Revision tracking for query invalidation.
//!
//! Revisions are monotonically increasing counters that track when inputs change.
//! Every stored value is stamped with the revision at which it last changed and,
//! for derived values, the revision at which it was last confirmed fresh.

use core::fmt;

/// A revision number representing a point in the database's mutation history.
///
/// Revisions are monotonically increasing - a higher revision means
/// a more recent change. Used for:
/// - Recording when an input was last assigned
/// - Recording when a derived value last changed or was last verified
/// - Deciding whether a cached value is older than something it read
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Revision(u64);

impl Revision {
    /// The initial revision (before any inputs are set).
    pub const INITIAL: Self = Self(0);

    /// Create a revision from a raw value.
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw revision value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Check if this revision is newer than another.
    #[inline]
    pub const fn is_newer_than(self, other: Self) -> bool {
        self.0 > other.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "r{}", self.0)
    }
}

/// Revision counter owned by a single database.
///
/// Only `set` and effective `remove` calls advance it; it is never reset.
#[derive(Debug, Default)]
pub struct RevisionCounter {
    current: Revision,
}

impl RevisionCounter {
    /// Create a new revision counter starting at the initial revision.
    #[inline]
    pub const fn new() -> Self {
        Self {
            current: Revision::INITIAL,
        }
    }

    /// Get the current revision.
    #[inline]
    pub const fn current(&self) -> Revision {
        self.current
    }

    /// Increment and return the new revision.
    ///
    /// This should be called whenever an input changes.
    #[inline]
    pub fn increment(&mut self) -> Revision {
        self.current = Revision(self.current.0 + 1);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_initial() {
        let counter = RevisionCounter::new();
        assert_eq!(counter.current(), Revision::INITIAL);
        assert_eq!(counter.current().get(), 0);
    }

    #[test]
    fn increment_is_monotonic() {
        let mut counter = RevisionCounter::default();
        let first = counter.increment();
        let second = counter.increment();
        assert_eq!(first, Revision::new(1));
        assert_eq!(second, Revision::new(2));
        assert!(second.is_newer_than(first));
        assert!(!first.is_newer_than(second));
        assert_eq!(counter.current(), second);
    }

    #[test]
    fn display_prefixes_revision() {
        assert_eq!(Revision::new(7).to_string(), "r7");
    }
}
