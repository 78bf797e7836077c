//! Error types for the recache core

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for cache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during cache operations
    #[error("cache {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(" for {}", p.display())))]
    #[diagnostic(
        code(recache::io),
        help("Check permissions on the cache directory")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "rename")
        operation: String,
    },

    /// Configured cache path exists but is not a directory
    #[error("cache path {} exists and is not a directory", path.display())]
    #[diagnostic(
        code(recache::invalid_cache_dir),
        help("Point cache_dir at a directory, or remove the conflicting file")
    )]
    InvalidCacheDir {
        /// The offending path
        path: Box<Path>,
    },

    /// A bucket file parsed but its top-level shape is not an object
    #[error("cache at {} could not be deserialized to a mapping", path.display())]
    #[diagnostic(code(recache::malformed_cache))]
    MalformedCache {
        /// Path of the malformed bucket file
        path: Box<Path>,
    },

    /// A bucket file contains syntactically invalid content
    ///
    /// Only surfaced when tolerant parsing is disabled; the default policy
    /// treats such files as empty.
    #[error("cache at {} could not be parsed", path.display())]
    #[diagnostic(
        code(recache::parse),
        help("Set ignore_invalid to treat unparseable bucket files as empty")
    )]
    Parse {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
        /// Path of the unparseable bucket file
        path: Box<Path>,
    },

    /// An argument value cannot be canonically serialized into a cache key
    #[error("unsupported argument: {message}")]
    #[diagnostic(code(recache::unsupported_argument))]
    UnsupportedArgument {
        /// Description of the offending value
        message: String,
    },

    /// A file extension no codec is registered for
    #[error("unsupported file extension '{extension}'")]
    #[diagnostic(code(recache::unsupported_format))]
    UnsupportedFormat {
        /// The requested extension
        extension: String,
    },

    /// A wrapped computation returned a value of the wrong shape
    #[error("expected the wrapped computation to return {expected}: {message}")]
    #[diagnostic(code(recache::result_type))]
    ResultType {
        /// The shape the adapter requires
        expected: &'static str,
        /// What was received instead
        message: String,
    },

    /// Configuration or validation error
    #[error("cache configuration error: {message}")]
    #[diagnostic(code(recache::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Serialization error
    #[error("serialization error: {message}")]
    #[diagnostic(code(recache::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },
}

impl Error {
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

    /// Create an invalid-cache-dir error
    #[must_use]
    pub fn invalid_cache_dir(path: impl AsRef<Path>) -> Self {
        Self::InvalidCacheDir {
            path: path.as_ref().into(),
        }
    }

    /// Create a malformed-cache error
    #[must_use]
    pub fn malformed_cache(path: impl AsRef<Path>) -> Self {
        Self::MalformedCache {
            path: path.as_ref().into(),
        }
    }

    /// Create a parse error
    #[must_use]
    pub fn parse(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Parse {
            source,
            path: path.as_ref().into(),
        }
    }

    /// Create an unsupported-argument error
    #[must_use]
    pub fn unsupported_argument(msg: impl Into<String>) -> Self {
        Self::UnsupportedArgument {
            message: msg.into(),
        }
    }

    /// Create an unsupported-format error
    #[must_use]
    pub fn unsupported_format(extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    /// Create a result-type error
    #[must_use]
    pub fn result_type(expected: &'static str, msg: impl Into<String>) -> Self {
        Self::ResultType {
            expected,
            message: msg.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;
