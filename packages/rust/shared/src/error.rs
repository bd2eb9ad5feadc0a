//! Error types for pubtools.
//!
//! Library crates use [`PubtoolsError`] via `thiserror`.
//! App crates wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all pubtools operations.
#[derive(Debug, thiserror::Error)]
pub enum PubtoolsError {
    /// The template file does not exist or is not a regular file.
    #[error("there is no template file at {path:?}")]
    MissingTemplateFile { path: PathBuf },

    /// An XML document could not be parsed.
    #[error("malformed XML in {path:?}: {message}")]
    MalformedXml { path: PathBuf, message: String },

    /// A required element is absent from the template.
    #[error("template {path:?} has no <{element}> element")]
    MissingElement { path: PathBuf, element: String },

    /// The search service could not be reached or answered with an error.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The search service rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    /// A lookup returned zero hits.
    #[error("no results found in index '{index}' for {query}")]
    NoResultsFound { index: String, query: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Response decoding or field extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid input (bad directory, bad argument combination, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PubtoolsError>;

impl PubtoolsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed_xml(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::MalformedXml {
            path: path.into(),
            message: msg.into(),
        }
    }
}
