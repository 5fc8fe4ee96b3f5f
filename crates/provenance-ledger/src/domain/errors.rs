//! Error types for the provenance ledger
//!
//! Every failure a caller can observe is a `LedgerError`. Store adapters speak
//! `StoreError` (see `ports::outbound`) and the application layer translates.

use shared_types::{RecordId, RecordKind};
use std::fmt;
use thiserror::Error;

/// All errors that can occur in ledger operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A required field is missing or malformed. Raised before any hashing.
    #[error("Validation failed on `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Insert collided with an existing unique key.
    #[error("Duplicate {field}: {value}")]
    DuplicateKey { field: &'static str, value: String },

    /// Point lookup found nothing.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// Status change rejected by the state machine or by a concurrent writer.
    #[error("Illegal transition on {record_id} from {from} to {to}: {reason}")]
    IllegalTransition {
        record_id: RecordId,
        from: String,
        to: String,
        reason: TransitionRejection,
    },

    /// Caller's role or identity does not allow the operation.
    #[error("Forbidden: cannot {action}: {reason}")]
    Forbidden { action: &'static str, reason: String },

    /// Store call failed or exceeded its deadline. Retryable.
    #[error("Record store unavailable during {operation}: {reason}")]
    StoreUnavailable {
        operation: &'static str,
        reason: String,
    },

    /// Recomputed fingerprint differs from the stored one.
    #[error("Tamper detected on {kind} {record_id}: stored {stored}, recomputed {recomputed}")]
    TamperDetected {
        record_id: RecordId,
        kind: RecordKind,
        stored: String,
        recomputed: String,
    },
}

/// Why a transition was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionRejection {
    /// No edge between the two states.
    UndefinedEdge,
    /// The edge exists but this party may not take it.
    NotPermitted { actor: String },
    /// Another writer changed the record first.
    StaleState { observed: String },
    /// Linked crop is not in a dispatchable state.
    CropNotEligible { crop_status: String },
    /// The crop already has a pending or in-transit shipment.
    ActiveShipmentExists,
}

impl fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedEdge => f.write_str("no such transition"),
            Self::NotPermitted { actor } => write!(f, "{actor} is not permitted"),
            Self::StaleState { observed } => write!(f, "state changed concurrently (now {observed})"),
            Self::CropNotEligible { crop_status } => {
                write!(f, "crop is {crop_status} and cannot be dispatched")
            }
            Self::ActiveShipmentExists => f.write_str("crop already has an active shipment"),
        }
    }
}

/// Coarse error category, stable for callers that branch on failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    DuplicateKey,
    NotFound,
    IllegalTransition,
    Forbidden,
    StoreUnavailable,
    TamperDetected,
}

impl LedgerError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn forbidden(action: &'static str, reason: impl Into<String>) -> Self {
        Self::Forbidden {
            action,
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            Self::TamperDetected { .. } => ErrorKind::TamperDetected,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Store outages are retryable by the caller. A batch-number collision
    /// is retryable because the next attempt draws a fresh number. Illegal
    /// transitions are never retried, including a lost race.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. }
                | Self::DuplicateKey {
                    field: "batch_number",
                    ..
                }
        )
    }
}
