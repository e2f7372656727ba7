//! Error types for trafficr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in trafficr
#[derive(Debug, Error)]
pub enum TrafficError {
    /// Invalid quota, window, or mode configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Browser session acquisition or page interaction failed
    #[error("Browser error: {0}")]
    Browser(String),

    /// CAPTCHA detection/solving failed
    #[error("Captcha error: {0}")]
    Captcha(String),

    /// VPN/proxy identity operation failed
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for trafficr operations
pub type Result<T> = std::result::Result<T, TrafficError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = TrafficError::Config("active_hours is empty".to_string());
        assert_eq!(err.to_string(), "Configuration error: active_hours is empty");
    }

    #[test]
    fn test_browser_error() {
        let err = TrafficError::Browser("driver creation failed".to_string());
        assert_eq!(err.to_string(), "Browser error: driver creation failed");
    }

    #[test]
    fn test_invalid_state_error() {
        let err = TrafficError::InvalidState("pool already running".to_string());
        assert_eq!(err.to_string(), "Invalid state: pool already running");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TrafficError = io_err.into();
        assert!(matches!(err, TrafficError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<u64> {
            Ok(7)
        }

        assert!(returns_ok().is_ok());
    }
}
