//! Errors raised while evaluating queries.

use thiserror::Error;

/// Result alias used by query logic and the database API.
pub type QueryResult<T> = Result<T, QueryError>;

/// Failure of a query evaluation.
///
/// Keys and stack entries are rendered as `name(argument)` at the point of
/// failure, so the error stays meaningful after the database moves on.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A query was re-entered with the same key while it was still executing.
    #[error("cycle detected: {key} is already active in [{}]", stack.join(" -> "))]
    Cycle {
        /// The key that was entered a second time.
        key: String,
        /// Active frames from the outermost query inwards.
        stack: Vec<String>,
    },

    /// An input query was read before a value was assigned to it.
    #[error("no input set for {query}({key})")]
    NoInput {
        /// Name of the query definition.
        query: &'static str,
        /// Rendered argument.
        key: String,
    },

    /// Nested evaluation went deeper than the configured limit.
    #[error("query depth limit of {limit} exceeded while entering {key}")]
    DepthExceeded {
        /// The configured `max_query_depth`.
        limit: usize,
        /// The key that would have exceeded the limit.
        key: String,
    },

    /// Query logic failed with its own error.
    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

impl QueryError {
    /// Whether this is a [`QueryError::Cycle`].
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle { .. })
    }

    /// Whether this is a [`QueryError::NoInput`].
    pub const fn is_no_input(&self) -> bool {
        matches!(self, Self::NoInput { .. })
    }
}
