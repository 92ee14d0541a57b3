//! Execution stack for dependency tracking and cycle detection.

use crate::query::QueryKey;
use crate::revision::Revision;
use rustc_hash::FxHashSet;

/// The record of one in-progress query evaluation.
#[derive(Debug)]
pub struct QueryFrame {
    /// The key being evaluated.
    pub key: QueryKey,
    /// Newest change revision observed among the frame's reads.
    pub max_revision: Revision,
    /// Keys read so far, in first-read order.
    pub dependencies: Vec<QueryKey>,
    seen: FxHashSet<QueryKey>,
}

impl QueryFrame {
    fn new(key: QueryKey) -> Self {
        Self {
            key,
            max_revision: Revision::INITIAL,
            dependencies: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    fn add_dependency(&mut self, key: QueryKey) {
        if self.seen.insert(key) {
            self.dependencies.push(key);
        }
    }

    fn track_revision(&mut self, revision: Revision) {
        self.max_revision = self.max_revision.max(revision);
    }
}

/// Stack of currently executing queries.
///
/// Membership of active keys is kept in a set next to the frames, so the cycle
/// check does not scan the stack.
#[derive(Debug, Default)]
pub struct ExecutionStack {
    frames: Vec<QueryFrame>,
    active: FxHashSet<QueryKey>,
}

impl ExecutionStack {
    #[inline]
    pub fn is_active(&self, key: QueryKey) -> bool {
        self.active.contains(&key)
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Start a frame for `key`. The caller has already ruled out a cycle.
    pub fn push(&mut self, key: QueryKey) {
        self.active.insert(key);
        self.frames.push(QueryFrame::new(key));
    }

    /// Finish the innermost frame without touching its parent.
    pub fn pop(&mut self) -> Option<QueryFrame> {
        let frame = self.frames.pop()?;
        self.active.remove(&frame.key);
        Some(frame)
    }

    /// Discard every frame above `depth`. Returns how many were discarded.
    pub fn unwind_to(&mut self, depth: usize) -> usize {
        if depth >= self.frames.len() {
            return 0;
        }
        let mut discarded = 0;
        for frame in self.frames.drain(depth..) {
            self.active.remove(&frame.key);
            discarded += 1;
        }
        discarded
    }

    /// Record a read in the innermost frame, if any.
    pub fn record_dependency(&mut self, key: QueryKey) {
        if let Some(frame) = self.frames.last_mut() {
            frame.add_dependency(key);
        }
    }

    /// Raise the innermost frame's `max_revision`, if any.
    pub fn track_revision(&mut self, revision: Revision) {
        if let Some(frame) = self.frames.last_mut() {
            frame.track_revision(revision);
        }
    }

    /// Fold a finished child's reads and change revision into the innermost frame.
    pub fn absorb(&mut self, dependencies: &[QueryKey], revision: Revision) {
        if let Some(frame) = self.frames.last_mut() {
            for &key in dependencies {
                frame.add_dependency(key);
            }
            frame.track_revision(revision);
        }
    }

    /// Active keys from the outermost frame inwards.
    pub fn keys(&self) -> impl Iterator<Item = QueryKey> + '_ {
        self.frames.iter().map(|frame| frame.key)
    }
}
