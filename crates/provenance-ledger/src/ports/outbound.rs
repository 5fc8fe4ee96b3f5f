//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the ledger requires the host application to provide.
//!
//! Production deployments back `RecordStore` with a database that offers
//! unique indexes and transactional conditional updates. Testing uses
//! `InMemoryRecordStore` (adapters/memory_store.rs).

use crate::domain::{
    BatchNumber, ComplaintStatus, CropStatus, Fingerprint, FixedPoint, LedgerRecord, PartyRole,
    ShipmentStatus, UniqueKey,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared_types::{PartyId, RecordId, RecordKind};
use thiserror::Error;

/// Errors reported by record store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An insert or update would duplicate a unique key.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(UniqueKey),

    /// A conditional update found the record in a different state.
    #[error("Precondition failed on {id}: expected {expected}, found {actual}")]
    PreconditionFailed {
        id: RecordId,
        expected: String,
        actual: String,
    },

    /// An update targeted a record that does not exist.
    #[error("Record missing: {0}")]
    Missing(RecordId),

    /// Backend unreachable, timed out, or refused the call.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Equality filters over stored records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    BatchNumber(BatchNumber),
    Fingerprint(Fingerprint),
    /// Records naming `party`, optionally only in one role.
    Party {
        party: PartyId,
        role: Option<PartyRole>,
    },
    /// The crop itself plus every record linked to it.
    Crop(RecordId),
    Kind(RecordKind),
}

impl RecordFilter {
    pub fn matches(&self, record: &LedgerRecord) -> bool {
        match self {
            Self::BatchNumber(batch) => record.batch_number() == Some(batch),
            Self::Fingerprint(fp) => record.fingerprint() == *fp,
            Self::Party { party, role } => record.involves(party, *role),
            Self::Crop(crop_id) => record.linked_crop() == Some(*crop_id),
            Self::Kind(kind) => record.kind() == *kind,
        }
    }
}

/// A status or stock change, applied only if the record still holds
/// `expected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordUpdate {
    Shipment {
        id: RecordId,
        expected: ShipmentStatus,
        next: ShipmentStatus,
        /// Written only if the shipment has no delivery date yet.
        delivery_date: Option<DateTime<Utc>>,
    },
    Crop {
        id: RecordId,
        expected: CropStatus,
        next: CropStatus,
    },
    Stock {
        id: RecordId,
        expected: FixedPoint,
        next: FixedPoint,
    },
    Complaint {
        id: RecordId,
        expected: ComplaintStatus,
        next: ComplaintStatus,
    },
}

impl RecordUpdate {
    pub fn id(&self) -> RecordId {
        match self {
            Self::Shipment { id, .. }
            | Self::Crop { id, .. }
            | Self::Stock { id, .. }
            | Self::Complaint { id, .. } => *id,
        }
    }

    /// Produce the updated copy of `current`, or explain why the guard failed.
    ///
    /// Adapters call this while holding whatever lock or transaction makes the
    /// read-check-write atomic.
    pub fn apply_to(&self, current: &LedgerRecord) -> Result<LedgerRecord, StoreError> {
        let mismatch = |expected: &dyn ToString, actual: &dyn ToString| StoreError::PreconditionFailed {
            id: self.id(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        };

        let mut updated = current.clone();
        match (self, &mut updated) {
            (
                Self::Shipment {
                    expected,
                    next,
                    delivery_date,
                    ..
                },
                LedgerRecord::Shipment(s),
            ) => {
                if s.status != *expected {
                    return Err(mismatch(expected, &s.status));
                }
                s.status = *next;
                if s.delivery_date.is_none() {
                    s.delivery_date = *delivery_date;
                }
            }
            (Self::Crop { expected, next, .. }, LedgerRecord::Crop(c)) => {
                if c.status != *expected {
                    return Err(mismatch(expected, &c.status));
                }
                c.status = *next;
            }
            (Self::Stock { expected, next, .. }, LedgerRecord::Listing(l)) => {
                if l.stock_quantity != *expected {
                    return Err(mismatch(expected, &l.stock_quantity));
                }
                l.stock_quantity = *next;
            }
            (Self::Complaint { expected, next, .. }, LedgerRecord::Complaint(c)) => {
                if c.status != *expected {
                    return Err(mismatch(expected, &c.status));
                }
                c.status = *next;
            }
            (_, other) => return Err(mismatch(&self.target_kind(), &other.kind())),
        }
        Ok(updated)
    }

    fn target_kind(&self) -> RecordKind {
        match self {
            Self::Shipment { .. } => RecordKind::Shipment,
            Self::Crop { .. } => RecordKind::Crop,
            Self::Stock { .. } => RecordKind::Listing,
            Self::Complaint { .. } => RecordKind::Complaint,
        }
    }
}

/// One step of an atomic commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Insert(LedgerRecord),
    Update(RecordUpdate),
}

/// Abstract interface for durable record storage.
///
/// ## Atomicity
///
/// `commit` applies all operations or none. Unique keys
/// (`LedgerRecord::unique_keys`) are checked against the state the batch
/// produces, so an update that ends a shipment releases its active-shipment key
/// within the same batch.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point lookup by id.
    async fn get(&self, id: RecordId) -> Result<Option<LedgerRecord>, StoreError>;

    /// All records matching `filter`, in insertion order.
    async fn find(&self, filter: &RecordFilter) -> Result<Vec<LedgerRecord>, StoreError>;

    /// Apply `ops` atomically.
    async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;

    /// Insert a single record.
    async fn insert(&self, record: LedgerRecord) -> Result<(), StoreError> {
        self.commit(vec![WriteOp::Insert(record)]).await
    }
}

/// Abstract interface for wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Abstract interface for randomness used in salts and batch numbers.
pub trait EntropySource: Send + Sync {
    /// `len` random characters from `[0-9a-z]`.
    fn base36(&self, len: usize) -> String;
}
