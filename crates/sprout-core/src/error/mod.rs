//! Error types and result aliases for Sprout operations.
//!
//! Provides a unified error type that covers every failure the installer can
//! surface, with actionable messages for the operator.

use thiserror::Error;

/// Unified error type for all Sprout operations
#[derive(Error, Debug)]
pub enum SproutError {
    // Config errors
    #[error("Failed to parse sprout.toml: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Failed to parse JSON: {message}")]
    JsonParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Server errors
    #[error("Server list '{name}' is not registered")]
    ServerListNotRegistered { name: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Server answered HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    // Package errors
    #[error("Integrity check failed for {package}: expected {expected}, got {actual}")]
    IntegrityFailure {
        package: String,
        expected: String,
        actual: String,
    },

    #[error("Archive {path} could not be read: {reason}")]
    Archive { path: String, reason: String },

    #[error("Archive {path} contains no entries")]
    EmptyArchive { path: String },

    #[error("Refusing to write outside the installation root: {path}")]
    UnsafePath { path: String },

    // Environment errors
    #[error("Environment check failed:\n{}", deficiencies.join("\n"))]
    Environment { deficiencies: Vec<String> },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Sprout operations
pub type SproutResult<T> = Result<T, SproutError>;

impl SproutError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create a JSON error from a serde_json failure
    pub fn json(context: &str, source: &serde_json::Error) -> Self {
        Self::JsonParse {
            message: format!("{}: {}", context, source),
        }
    }

    /// Check if this error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            SproutError::Network { .. } | SproutError::Io { .. } => true,
            SproutError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            SproutError::ServerListNotRegistered { .. } => {
                Some("Add the server list to the [server_lists] section of sprout.toml")
            },
            SproutError::Network { .. } => Some("Check your internet connection and try again"),
            SproutError::IntegrityFailure { .. } => {
                Some("The download was corrupted or tampered with; retry or pick another mirror")
            },
            SproutError::Environment { .. } | SproutError::Io { .. } => {
                Some("Make sure the installation root is writable by the current user")
            },
            SproutError::UnsafePath { .. } => {
                Some("The package archive is malformed; report it to the package maintainer")
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_error_lists_every_deficiency() {
        let err = SproutError::Environment {
            deficiencies: vec![
                "Can't create files (chmod)".to_string(),
                "Can't create directories (chmod)".to_string(),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("Can't create files (chmod)"));
        assert!(message.contains("Can't create directories (chmod)"));
    }

    #[test]
    fn test_recoverable_errors() {
        let net = SproutError::Network {
            message: "timeout".to_string(),
            source: None,
        };
        assert!(net.is_recoverable());

        let unavailable = SproutError::HttpStatus {
            url: "http://mirror/index.php".to_string(),
            status: 503,
        };
        assert!(unavailable.is_recoverable());

        let missing = SproutError::HttpStatus {
            url: "http://mirror/index.php".to_string(),
            status: 404,
        };
        assert!(!missing.is_recoverable());

        let integrity = SproutError::IntegrityFailure {
            package: "tools.main-stable".to_string(),
            expected: "abc123".to_string(),
            actual: "abc124".to_string(),
        };
        assert!(!integrity.is_recoverable());
        assert!(integrity.suggestion().is_some());
    }

    #[test]
    fn test_json_error_keeps_context() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = SproutError::json("server list 'main'", &source);
        assert!(err.to_string().starts_with("Failed to parse JSON: server list 'main'"));
    }
}
