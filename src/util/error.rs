//! Error types for the scene index library.
//!
//! Data source queries never fail: absence is `None` and type mismatches
//! fall back to defaults. Errors only surface at the edges where text is
//! parsed into paths or locators.

use thiserror::Error;

/// Main error type for scene index operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Text could not be parsed as a scene path
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Text could not be parsed as a data source locator
    #[error("Invalid locator '{0}'")]
    InvalidLocator(String),
}

impl Error {
    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for scene index operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::invalid_path("/a//b", "empty element");
        assert!(e.to_string().contains("/a//b"));
        assert!(e.to_string().contains("empty element"));
    }

    #[test]
    fn test_invalid_locator_from_parse() {
        let err = crate::core::Locator::parse("a..b").unwrap_err();
        assert_eq!(err, Error::InvalidLocator("a..b".to_string()));
        assert_eq!(err.to_string(), "Invalid locator 'a..b'");
    }
}
