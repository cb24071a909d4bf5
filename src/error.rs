//! Error types for skills-utils.
//!
//! All fallible operations in this crate return [`Result`], whose error type is
//! the [`SkillsError`] enum.
//!
//! Two outcomes are deliberately *not* errors: a failure to delete a temporary
//! index after a failed population is logged and swallowed, and per-document
//! bulk failures are reported as counts in
//! [`BulkStats`](crate::index::bulk::BulkStats).
//!
//! # Examples
//!
//! ```
//! use skills_utils::error::{SkillsError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SkillsError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for skills-utils operations.
#[derive(Error, Debug)]
pub enum SkillsError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rejected index settings or invalid configuration. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied population logic failed while filling a temporary index.
    #[error("Population of index {index} failed: {source}")]
    Population {
        index: String,
        #[source]
        source: Box<SkillsError>,
    },

    /// Search backend errors (alias updates, deletes, bulk transport)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A named resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A conditional write lost against a concurrent writer
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed input (quarters, dates, paths)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with SkillsError.
pub type Result<T> = std::result::Result<T, SkillsError>;

impl SkillsError {
    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        SkillsError::Configuration(msg.into())
    }

    /// Wrap an error raised while populating `index`.
    pub fn population<S: Into<String>>(index: S, source: SkillsError) -> Self {
        SkillsError::Population {
            index: index.into(),
            source: Box::new(source),
        }
    }

    /// Create a new backend error.
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        SkillsError::Backend(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        SkillsError::Storage(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        SkillsError::NotFound(msg.into())
    }

    /// Create a new conflict error.
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        SkillsError::Conflict(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        SkillsError::InvalidArgument(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        SkillsError::Parse(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SkillsError::Other(msg.into())
    }

    /// Whether this error is a [`SkillsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, SkillsError::NotFound(_))
    }
}
