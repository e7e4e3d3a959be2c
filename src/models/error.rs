//! Error types for the scheduling engine.
use thiserror::Error;

/// Errors surfaced by the scheduling engine.
///
/// Both variants indicate a caller contract violation rather than a
/// transient condition, so there is nothing to retry. Callers decide
/// recovery (re-fetch the card, skip it in the queue).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The rating or settings passed in are unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A stored scheduling state is missing required fields. Surfaced
    /// instead of coercing to defaults, which would mask persistence
    /// corruption upstream.
    #[error("malformed scheduling state: {0}")]
    MalformedState(String),
}
