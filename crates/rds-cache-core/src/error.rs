//! Error types for cache operations

use thiserror::Error;

/// Main error type for all cache operations
///
/// None of these ever leave a `CacheService` operation; they are settled into
/// the operation's default result at the facade boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Caching switched off by configuration
    #[error("cache disabled")]
    Disabled,

    /// No connection handle was ever established
    #[error("connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// Backend connection failed or dropped
    #[error("connection error: {0}")]
    Connection(String),

    /// Backend command failed
    #[error("backend error: {0}")]
    Backend(String),

    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Configuration could not be loaded or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Timeout
    #[error("operation timed out")]
    Timeout,
}

impl CacheError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Disabled => "disabled",
            CacheError::ConnectionUnavailable(_) => "connection_unavailable",
            CacheError::Connection(_) => "connection",
            CacheError::Backend(_) => "backend",
            CacheError::Serialization(_) => "serialization",
            CacheError::Deserialization(_) => "deserialization",
            CacheError::Config(_) => "config",
            CacheError::Timeout => "timeout",
        }
    }

    /// Whether the error came from the link to the store rather than a command
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            CacheError::ConnectionUnavailable(_) | CacheError::Connection(_) | CacheError::Timeout
        )
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::Backend("WRONGTYPE".to_string());
        assert_eq!(err.to_string(), "backend error: WRONGTYPE");

        let err = CacheError::Deserialization("eof".to_string());
        assert_eq!(err.to_string(), "deserialization error: eof");

        assert_eq!(CacheError::Disabled.to_string(), "cache disabled");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(CacheError::Disabled.kind(), "disabled");
        assert_eq!(CacheError::Timeout.kind(), "timeout");
        assert_eq!(
            CacheError::ConnectionUnavailable("no handle".into()).kind(),
            "connection_unavailable"
        );
    }

    #[test]
    fn test_is_connection() {
        assert!(CacheError::Connection("reset".into()).is_connection());
        assert!(CacheError::Timeout.is_connection());
        assert!(!CacheError::Backend("ERR".into()).is_connection());
        assert!(!CacheError::Disabled.is_connection());
    }
}
