//! Error handling for the apitool conversion library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. It uses `thiserror` for easy
//! error handling and implements conversions from common error types.
//!
//! Spec problems fall into three kinds, see [`ErrorKind`]:
//! validation failures at load time, conversion failures while walking the
//! document, and recognized OpenAPI features this library does not implement.
//!
//! # Examples
//!
//! ```
//! use apitool_core::error::{Error, ErrorKind, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::unsupported("requestBody.oneOf", "schema combinator 'oneOf'"))
//! }
//!
//! assert_eq!(might_fail().unwrap_err().kind(), ErrorKind::UnsupportedFeature);
//! ```

use thiserror::Error;

/// Result type for apitool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for apitool operations
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unsupported spec at load time
    #[error("Validation error: {0}")]
    Validation(String),

    /// Structural problem found while extracting or emitting operations
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Recognized OpenAPI feature that is not implemented
    #[error("Unsupported feature at '{path}': {feature}")]
    UnsupportedFeature { path: String, feature: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`], for callers that react per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conversion,
    UnsupportedFeature,
    Config,
    Io,
}

impl Error {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new conversion error
    pub fn conversion<S: Into<String>>(msg: S) -> Self {
        Self::Conversion(msg.into())
    }

    /// Create a new unsupported feature error at a dotted spec location
    pub fn unsupported<P: Into<String>, F: Into<String>>(path: P, feature: F) -> Self {
        Self::UnsupportedFeature {
            path: path.into(),
            feature: feature.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conversion(_) => ErrorKind::Conversion,
            Self::UnsupportedFeature { .. } => ErrorKind::UnsupportedFeature,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) | Self::Yaml(_) | Self::Json(_) => ErrorKind::Io,
        }
    }
}
