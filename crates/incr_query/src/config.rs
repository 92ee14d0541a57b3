//! Construction-time settings for a [`QueryDatabase`](crate::QueryDatabase).

/// Tuning knobs for a query database.
///
/// The default configuration places no limit on nesting depth.
///
/// ```
/// use incr_query::{DatabaseConfig, QueryDatabase};
///
/// let config = DatabaseConfig::new().with_max_query_depth(256);
/// let db = QueryDatabase::with_config(config);
/// assert_eq!(db.config().max_query_depth, Some(256));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Maximum number of nested query evaluations.
    ///
    /// Recomputation recurses on the native stack, so a very deep dependency
    /// chain can overflow it. With a limit set, entering one query too many
    /// fails with [`QueryError::DepthExceeded`](crate::QueryError::DepthExceeded)
    /// instead.
    pub max_query_depth: Option<usize>,
}

impl DatabaseConfig {
    #[inline]
    pub const fn new() -> Self {
        Self {
            max_query_depth: None,
        }
    }

    /// Limit nested evaluations to `depth` frames.
    #[inline]
    #[must_use]
    pub const fn with_max_query_depth(mut self, depth: usize) -> Self {
        self.max_query_depth = Some(depth);
        self
    }
}
