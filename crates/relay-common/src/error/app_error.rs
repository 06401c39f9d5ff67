//! Application error types
//!
//! Process-level failures. Per-connection errors never reach this type.

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The listener could not bind; always fatal
    #[error("Failed to bind to {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),
}

impl AppError {
    /// Create a listen error for an address
    pub fn listen(addr: impl std::fmt::Display, source: std::io::Error) -> Self {
        Self::Listen {
            addr: addr.to_string(),
            source,
        }
    }

    /// Process exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78,
            Self::Listen { .. } | Self::Server(_) => 1,
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_listen_error_message() {
        let err = AppError::listen(
            "0.0.0.0:8080",
            io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        );
        assert_eq!(err.to_string(), "Failed to bind to 0.0.0.0:8080: address in use");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AppError = ConfigError::InvalidValue("RELAY_PORT", "x".to_string()).into();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(err.exit_code(), 78);
        assert_eq!(err.to_string(), "Configuration error: Invalid value for RELAY_PORT: x");
    }
}
