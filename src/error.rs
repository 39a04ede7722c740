use std::fmt;

/// The main error type for dialback operations
#[derive(Debug, thiserror::Error)]
pub enum DialbackError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid phone number: {0}")]
    InvalidNumber(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DialbackError {
    /// Create a configuration error
    pub fn config(msg: impl fmt::Display) -> Self {
        Self::Config(msg.to_string())
    }

    /// Create an invalid-phone-number error
    pub fn invalid_number(msg: impl fmt::Display) -> Self {
        Self::InvalidNumber(msg.to_string())
    }

    /// Create a delivery error
    pub fn delivery(msg: impl fmt::Display) -> Self {
        Self::Delivery(msg.to_string())
    }

    /// Create a storage error
    pub fn storage(msg: impl fmt::Display) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Create an internal error
    pub fn internal(msg: impl fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }
}

/// Result type alias using DialbackError
pub type Result<T> = std::result::Result<T, DialbackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DialbackError::config("missing master key");
        assert_eq!(err.to_string(), "Configuration error: missing master key");

        let err = DialbackError::invalid_number("too short");
        assert_eq!(err.to_string(), "Invalid phone number: too short");
    }
}
