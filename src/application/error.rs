//! Application-level errors

use std::path::PathBuf;
use thiserror::Error;

/// Application errors add file, helper and update context.
///
/// Domain errors never reach this level: unparsable status keys are logged
/// and skipped while the catalog loads.
#[derive(Error, Debug)]
pub enum ApplicationError {
    /// A services or status cache is missing or unreadable.
    #[error("service cache unavailable: {path}")]
    CatalogUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A services or status cache is not a well-formed property list.
    #[error("invalid service cache: {path}")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: plist::Error,
    },

    /// Pasteboard or clipboard helper failed.
    #[error("{helper} failed: {message}")]
    HelperProcess { helper: String, message: String },

    #[error("update failed: {message}")]
    Update { message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
