//! Error types for the cache crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Boxed error returned by a wrapped function
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for cache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during local cache operations
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(fncache::io),
        help("Check file permissions and ensure the cache directory is writable")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "create_dir_all")
        operation: String,
    },

    /// Configuration or validation error
    #[error("Cache configuration error: {message}")]
    #[diagnostic(code(fncache::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Remote object not found
    #[error("Remote object not found: {key}")]
    #[diagnostic(
        code(fncache::not_found),
        help("The object may never have been written to this bucket")
    )]
    NotFound {
        /// The object key that was not found
        key: String,
    },

    /// Remote object store failure
    #[error("Remote transport error: {message}")]
    #[diagnostic(
        code(fncache::transport),
        help("Check network connectivity, the bucket name and the credentials")
    )]
    Transport {
        /// Error message describing the transport failure
        message: String,
        /// Underlying transport error, if available
        #[source]
        source: Option<BoxError>,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(code(fncache::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },

    /// The wrapped function failed
    #[error("Cached function failed: {source}")]
    #[diagnostic(code(fncache::invocation))]
    Invocation {
        /// Error returned by the wrapped function
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }

    /// Create a not found error
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a transport error without an underlying source
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a transport error wrapping the underlying failure
    #[must_use]
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(source.into()),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Wrap an error returned by the cached function
    #[must_use]
    pub fn invocation(source: impl Into<BoxError>) -> Self {
        Self::Invocation {
            source: source.into(),
        }
    }

    /// Whether this error reports a missing remote object
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;
