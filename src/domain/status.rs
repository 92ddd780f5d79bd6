//! Parsing of `NSServicesStatus` keys from `pbs.plist`.
//!
//! The OS keys presentation-mode state by a composite string
//! `"<bundle id> - <service name> - <send type>"`. Only the middle part is
//! needed to cross-reference the services cache.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::DomainError;

/// Leading and trailing tokens never contain whitespace; the name is greedy.
const STATUS_KEY_PATTERN: &str = r"^(\S+) - (.+) - (\S+)$";

static STATUS_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(STATUS_KEY_PATTERN).expect("status key pattern is valid"));

/// Extract the service name from a status key.
///
/// The greedy middle group swallows every embedded `" - "`, so the suffix is
/// always the last whitespace-free token. A service whose name itself ends in
/// `" - <word>"` is therefore indistinguishable from one with that suffix.
///
/// # Errors
/// Returns `DomainError::StatusKeyUnparsable` if the key does not have three
/// ` - `-separated parts. Callers log and skip the entry.
pub fn parse_status_key(key: &str) -> Result<&str, DomainError> {
    STATUS_KEY_RE
        .captures(key)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
        .ok_or_else(|| DomainError::StatusKeyUnparsable {
            key: key.to_string(),
        })
}
