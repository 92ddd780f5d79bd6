//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent problems in the cached data itself.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A `NSServicesStatus` key did not have the `<token> - <name> - <token>` shape.
    /// Recoverable: the entry is skipped.
    #[error("could not parse service status key: {key}")]
    StatusKeyUnparsable { key: String },
}
