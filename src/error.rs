//! Error types for countdown calculation and configuration.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CountdownError>;

/// Errors raised when a countdown is given input it cannot work with.
///
/// Calculation and formatting are otherwise infallible: a target in the past
/// is not an error, it simply yields an expired [`TimeRemaining`].
///
/// [`TimeRemaining`]: crate::remaining::TimeRemaining
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CountdownError {
    /// The target string could not be parsed as a timestamp.
    #[error("invalid countdown target: {input:?}")]
    InvalidTarget {
        /// The rejected input, verbatim.
        input: String,
    },

    /// A configuration value is out of range (for example a zero tick interval).
    #[error("invalid countdown configuration: {0}")]
    InvalidConfiguration(String),
}

impl CountdownError {
    /// Create an invalid target error for the given input.
    pub fn invalid_target(input: impl Into<String>) -> Self {
        Self::InvalidTarget {
            input: input.into(),
        }
    }

    /// Create an invalid configuration error with the given message.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}
