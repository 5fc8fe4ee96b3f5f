//! Inbound Ports (Driving Ports / API)
//!
//! What the ledger offers to hosts: a web backend, a CLI, a batch importer.
//! Every operation that acts on behalf of a user takes the `CallerIdentity`
//! the identity provider resolved for the current request.

use crate::domain::{
    ComplaintRecord, CropRecord, CropTrace, InventoryListing, LedgerError, LedgerRecord,
    NewComplaint, NewCrop, NewListing, NewPurchase, NewShipment, PartyRole, PurchaseRecord,
    ShipmentRecord, ShipmentStatus, VerificationReport,
};
use async_trait::async_trait;
use shared_types::{CallerIdentity, PartyId, RecordId};

/// Append-only record storage with lookups.
#[async_trait]
pub trait LedgerStoreApi: Send + Sync {
    /// Persist an already-sealed record.
    ///
    /// Fails with `Validation` if a required field is missing or the seal does
    /// not match the content, and with `DuplicateKey` if the id, batch number
    /// or fingerprint already exists.
    async fn append(&self, record: LedgerRecord) -> Result<LedgerRecord, LedgerError>;

    /// Fails with `NotFound` when no record has this id.
    async fn get_by_id(&self, id: RecordId) -> Result<LedgerRecord, LedgerError>;

    /// Exact match on batch number or fingerprint. `Ok(None)` when neither hits.
    async fn find_by_batch_or_hash(&self, token: &str)
        -> Result<Option<LedgerRecord>, LedgerError>;

    /// Records naming `party`, newest first.
    async fn list_by_party(
        &self,
        party: &PartyId,
        role: Option<PartyRole>,
    ) -> Result<Vec<LedgerRecord>, LedgerError>;

    /// A crop with its shipments, listings and purchases.
    async fn trace_crop(&self, crop_id: RecordId) -> Result<CropTrace, LedgerError>;
}

/// Role-gated write paths of the supply chain.
#[async_trait]
pub trait SupplyChainApi: Send + Sync {
    /// Farmers only. Assigns a fresh batch number and seals the record.
    async fn register_crop(
        &self,
        caller: &CallerIdentity,
        draft: NewCrop,
    ) -> Result<CropRecord, LedgerError>;

    /// Crop owner only. At most one active shipment per crop.
    async fn request_shipment(
        &self,
        caller: &CallerIdentity,
        request: NewShipment,
    ) -> Result<ShipmentRecord, LedgerError>;

    /// Retailers only, for shipments delivered to them.
    async fn create_listing(
        &self,
        caller: &CallerIdentity,
        request: NewListing,
    ) -> Result<InventoryListing, LedgerError>;

    /// Customers only. Decrements stock and records the purchase atomically.
    async fn record_purchase(
        &self,
        caller: &CallerIdentity,
        request: NewPurchase,
    ) -> Result<PurchaseRecord, LedgerError>;

    async fn file_complaint(
        &self,
        caller: &CallerIdentity,
        complaint: NewComplaint,
    ) -> Result<ComplaintRecord, LedgerError>;

    /// Admins only.
    async fn resolve_complaint(
        &self,
        caller: &CallerIdentity,
        complaint_id: RecordId,
    ) -> Result<ComplaintRecord, LedgerError>;
}

/// Audited status changes.
#[async_trait]
pub trait TransitionApi: Send + Sync {
    /// Move a shipment along its state machine, with any crop cascade, as one
    /// atomic write.
    async fn transition_shipment(
        &self,
        caller: &CallerIdentity,
        shipment_id: RecordId,
        target: ShipmentStatus,
    ) -> Result<ShipmentRecord, LedgerError>;

    /// Move a crop to `verified`. Returns `false` if it already was.
    async fn mark_crop_verified(&self, crop_id: RecordId) -> Result<bool, LedgerError>;
}

/// Public authenticity checks.
#[async_trait]
pub trait VerificationApi: Send + Sync {
    /// Look up by batch number or fingerprint and recompute the fingerprint.
    ///
    /// An authentic crop is moved to `verified` on first verification.
    async fn verify(&self, token: &str) -> Result<VerificationReport, LedgerError>;

    /// Like `verify`, but absence and tampering are errors.
    async fn ensure_authentic(&self, token: &str) -> Result<LedgerRecord, LedgerError>;
}
