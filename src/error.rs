//! Unified error handling for Prism Engine.
//!
//! Every fallible public API returns [`EngineResult`]. Lookup misses are not
//! errors (they return `Option`); errors are reserved for invariant
//! violations, resource exhaustion, and lifecycle misuse.

use thiserror::Error;

/// Main error type for Prism Engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// A precondition that callers are required to uphold was violated.
    /// These are programmer errors, never recoverable runtime conditions.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A component table has no free slots left.
    #[error("component table '{kind}' is full (capacity {capacity})")]
    TableFull { kind: &'static str, capacity: usize },

    /// A component with this name already exists in the table.
    #[error("name '{name}' already exists in component table '{kind}'")]
    NameExists { kind: &'static str, name: String },

    /// The handle refers to a slot that was deleted or recycled.
    #[error("stale handle into component table '{kind}'")]
    StaleHandle { kind: &'static str },

    /// A collision shape description failed validation.
    #[error("invalid collision shape: {0}")]
    InvalidShape(String),

    /// A lifecycle method was called in the wrong state.
    #[error("invalid state: expected {expected}, actual {actual}")]
    StateError {
        expected: &'static str,
        actual: &'static str,
    },

    /// Spawning or joining the simulation thread failed.
    #[error("simulation thread error: {0}")]
    ThreadError(String),

    /// Configuration parsing or validation failed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Type alias for Results in Prism Engine.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::ThreadError(error.to_string())
    }
}

impl EngineError {
    /// Shorthand for an [`EngineError::InvariantViolation`].
    pub fn invariant(msg: impl Into<String>) -> Self {
        EngineError::InvariantViolation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::TableFull {
            kind: "entity",
            capacity: 8,
        };
        assert_eq!(
            err.to_string(),
            "component table 'entity' is full (capacity 8)"
        );
    }

    #[test]
    fn test_stale_handle_display() {
        let err = EngineError::StaleHandle { kind: "transform" };
        assert_eq!(
            err.to_string(),
            "stale handle into component table 'transform'"
        );
    }

    #[test]
    fn test_invariant_shorthand() {
        let err = EngineError::invariant("mass must be non-negative");
        assert!(matches!(err, EngineError::InvariantViolation(_)));
        assert_eq!(
            err.to_string(),
            "invariant violation: mass must be non-negative"
        );
    }
}
