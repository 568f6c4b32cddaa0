//! Error types for the rating engine
//!
//! Typed failures are declared with thiserror and carried through the crate
//! as anyhow errors, so callers can attach context and still classify a
//! failure with `downcast_ref::<RatingError>()`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific replay scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("Malformed match record: {reason}")]
    MalformedRecord { reason: String },

    #[error("Draws are not supported (match at {timestamp})")]
    DrawNotSupported { timestamp: i64 },

    #[error("Unsupported match topology: {teams} distinct teams, expected 2")]
    UnsupportedTopology { teams: usize },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl RatingError {
    /// Shorthand for a malformed record error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }
}
