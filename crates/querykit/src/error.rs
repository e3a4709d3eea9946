//! Error types for querykit

use thiserror::Error;

/// Result type alias for querykit operations
pub type QbResult<T> = Result<T, QbError>;

/// Errors raised while constructing or compiling a statement.
///
/// Every variant is raised synchronously by the call that detected it. Compilation
/// is deterministic, so retrying with the same input yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QbError {
    /// Malformed input: wrong operand arity, wrong operand shape, missing alias, ...
    ///
    /// The message is displayed verbatim.
    #[error("{0}")]
    InvalidArgument(String),

    /// No builder registered for a node, or the dialect cannot express a statement.
    #[error("{0}")]
    NotSupported(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Compiled SQL could not be bound for a driver.
    #[error("Bind error: {0}")]
    Bind(String),
}

impl QbError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a not supported error
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a bind error
    pub fn bind(message: impl Into<String>) -> Self {
        Self::Bind(message.into())
    }

    /// Error for a condition operator that received the wrong number of operands.
    pub(crate) fn arity(operator: &str, expected: &str) -> Self {
        Self::InvalidArgument(format!("Operator '{operator}' requires {expected}."))
    }

    /// Check if this is a malformed input error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a missing builder / unsupported statement error
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }
}

impl From<toml::de::Error> for QbError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
