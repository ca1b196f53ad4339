use thiserror::Error;

/// Errors raised while declaring or registering a DAG.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DagError {
    #[error("invalid dag id '{0}': use letters, digits, '_', '-' or '.'")]
    InvalidDagId(String),

    #[error("owner must not be empty")]
    EmptyOwner,

    #[error("retry delay must not be negative (got {secs}s)")]
    NegativeRetryDelay { secs: i64 },

    #[error("schedule interval must be positive (got {0})")]
    NonPositiveInterval(String),

    #[error("schedule interval {0} does not fit in i64 nanoseconds")]
    IntervalTooLong(String),

    #[error("invalid start date: {0}")]
    InvalidStartDate(String),

    #[error("task id must not be empty")]
    EmptyTaskId,

    #[error("task id '{0}' has leading or trailing whitespace")]
    InvalidTaskId(String),

    #[error("task '{0}' is already declared")]
    DuplicateTask(String),

    #[error("unknown task '{0}'")]
    UnknownTask(String),

    #[error("edge {upstream} -> {downstream} would create a cycle")]
    Cycle { upstream: String, downstream: String },

    #[error("dag '{0}' is already registered")]
    DuplicateDagId(String),
}
