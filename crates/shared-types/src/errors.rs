//! # Error Types
//!
//! Errors raised when parsing shared identifiers at the boundary.

use thiserror::Error;

/// Failure to parse a shared identifier from its text form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Role label not in the known set.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Record id is not a UUID.
    #[error("Invalid record id: {0}")]
    InvalidRecordId(String),
}
