//! # Provenance Records
//!
//! ## Clusters
//!
//! - **Statuses**: `CropStatus`, `ShipmentStatus`, `ComplaintStatus`
//! - **Records**: `CropRecord`, `ShipmentRecord`, `InventoryListing`,
//!   `PurchaseRecord`, `ComplaintRecord`, unified as `LedgerRecord`
//! - **Drafts**: caller-supplied content before ids, salts and fingerprints
//!   are assigned
//! - **Indexing**: `UniqueKey`, `PartyRole`
//!
//! Fingerprints cover the immutable content of a record only. Status fields
//! change through audited transitions and are left out of the canonical
//! payload so a legal status change never looks like tampering.

use crate::domain::errors::LedgerError;
use crate::domain::fingerprint::{CanonicalPayload, Fingerprint, Salt, Seal};
use crate::domain::value_objects::{BatchNumber, FixedPoint};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{PartyId, RecordId, RecordKind, Role};
use std::fmt;

// =============================================================================
// CLUSTER A: STATUSES
// =============================================================================

/// Category of a harvest lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CropType {
    Grain,
    Vegetable,
    Fruit,
    Legume,
    Tuber,
    Oilseed,
    CashCrop,
}

impl CropType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grain => "grain",
            Self::Vegetable => "vegetable",
            Self::Fruit => "fruit",
            Self::Legume => "legume",
            Self::Tuber => "tuber",
            Self::Oilseed => "oilseed",
            Self::CashCrop => "cash-crop",
        }
    }
}

/// Lifecycle of a crop lot.
///
/// `InTransit` is accepted for stored data but never entered by the ledger
/// itself: dispatching a shipment leaves the crop `Harvested`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropStatus {
    Harvested,
    InTransit,
    Delivered,
    Verified,
}

impl CropStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Harvested => "harvested",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Verified => "verified",
        }
    }

    /// Whether a shipment of this crop may be requested or dispatched.
    pub fn is_dispatchable(self) -> bool {
        matches!(self, Self::Harvested | Self::InTransit)
    }

    /// Verification is monotone: once verified, a crop stays verified.
    pub fn can_transition_to(self, next: CropStatus) -> bool {
        use CropStatus::*;
        match (self, next) {
            (Harvested | InTransit, Delivered) => true,
            (Harvested | InTransit | Delivered, Verified) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CropStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipment state machine.
///
/// ```text
/// pending ──dispatch──▶ in_transit ──deliver──▶ delivered
///    │
///    └──reject──▶ rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    Delivered,
    /// Legacy data spells this `stored`.
    #[serde(alias = "stored")]
    Rejected,
}

impl ShipmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (Pending, InTransit) | (Pending, Rejected) | (InTransit, Delivered)
        )
    }

    /// Pending or in transit. A crop has at most one active shipment.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::InTransit)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected)
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    Resolved,
}

impl ComplaintStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
        }
    }

    pub fn can_transition_to(self, next: ComplaintStatus) -> bool {
        matches!((self, next), (Self::Pending, Self::Resolved))
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CLUSTER B: RECORDS
// =============================================================================

/// Records that carry a seal over their canonical payload.
pub trait Fingerprinted {
    fn canonical_payload(&self) -> CanonicalPayload;

    fn seal(&self) -> &Seal;

    fn seal_mut(&mut self) -> &mut Seal;

    /// Hash the canonical payload under `salt` and attach the result.
    fn sealed(mut self, salt: Salt) -> Result<Self, LedgerError>
    where
        Self: Sized,
    {
        let seal = Seal::compute(&self.canonical_payload(), salt)?;
        *self.seal_mut() = seal;
        Ok(self)
    }
}

// Placeholder until `Fingerprinted::sealed` runs. Never stored.
fn unsealed(salt: &Salt) -> Seal {
    Seal {
        fingerprint: Fingerprint::default(),
        salt: salt.clone(),
    }
}

fn require_initial(actual: &str, initial: &str) -> Result<(), LedgerError> {
    if actual == initial {
        return Ok(());
    }
    Err(LedgerError::validation(
        "status",
        format!("new records start as {initial}, got {actual}"),
    ))
}

fn require_positive(field: &'static str, value: FixedPoint) -> Result<(), LedgerError> {
    if value.is_zero() {
        return Err(LedgerError::validation(field, "must be greater than zero"));
    }
    Ok(())
}

fn check_harvest(
    crop_name: &str,
    quantity: FixedPoint,
    sowing_date: Option<NaiveDate>,
    harvest_date: Option<NaiveDate>,
) -> Result<(), LedgerError> {
    if crop_name.trim().is_empty() {
        return Err(LedgerError::validation("crop_name", "must not be blank"));
    }
    require_positive("quantity", quantity)?;
    if let (Some(sown), Some(harvested)) = (sowing_date, harvest_date) {
        if sown > harvested {
            return Err(LedgerError::validation(
                "harvest_date",
                format!("harvest {harvested} precedes sowing {sown}"),
            ));
        }
    }
    Ok(())
}

macro_rules! impl_fingerprinted {
    ($ty:ty) => {
        impl Fingerprinted for $ty {
            fn canonical_payload(&self) -> CanonicalPayload {
                <$ty>::canonical_payload(self)
            }

            fn seal(&self) -> &Seal {
                &self.seal
            }

            fn seal_mut(&mut self) -> &mut Seal {
                &mut self.seal
            }
        }
    };
}

/// A registered harvest lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRecord {
    pub id: RecordId,
    pub owner_id: PartyId,
    pub crop_name: String,
    pub crop_type: CropType,
    pub quantity: FixedPoint,
    pub price_per_unit: FixedPoint,
    pub sowing_date: Option<NaiveDate>,
    pub harvest_date: Option<NaiveDate>,
    pub batch_number: BatchNumber,
    pub status: CropStatus,
    pub created_at: DateTime<Utc>,
    pub seal: Seal,
}

impl CropRecord {
    /// Build and seal a freshly harvested lot.
    pub fn register(
        owner_id: PartyId,
        draft: &NewCrop,
        batch_number: BatchNumber,
        salt: Salt,
    ) -> Result<Self, LedgerError> {
        let record = Self {
            id: RecordId::generate(),
            owner_id,
            crop_name: draft.crop_name.clone(),
            crop_type: draft.crop_type,
            quantity: draft.quantity,
            price_per_unit: draft.price_per_unit,
            sowing_date: draft.sowing_date,
            harvest_date: draft.harvest_date,
            batch_number,
            status: CropStatus::Harvested,
            created_at: salt.timestamp,
            seal: unsealed(&salt),
        };
        record.validate_initial()?;
        record.sealed(salt)
    }

    /// A crop enters the ledger harvested, with valid harvest content.
    pub fn validate_initial(&self) -> Result<(), LedgerError> {
        require_initial(self.status.as_str(), CropStatus::Harvested.as_str())?;
        check_harvest(
            &self.crop_name,
            self.quantity,
            self.sowing_date,
            self.harvest_date,
        )
    }

    pub fn canonical_payload(&self) -> CanonicalPayload {
        CanonicalPayload::new(RecordKind::Crop)
            .required("owner", self.owner_id.as_str())
            .required("crop_name", self.crop_name.as_str())
            .required("crop_type", self.crop_type.as_str())
            .required("quantity", self.quantity)
            .required("price_per_unit", self.price_per_unit)
            .optional("sowing_date", self.sowing_date)
            .optional("harvest_date", self.harvest_date)
            .required("batch_number", self.batch_number.as_str())
    }
}

impl_fingerprinted!(CropRecord);

/// Transport of a crop lot from one party to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub id: RecordId,
    pub crop_id: RecordId,
    pub from_party: PartyId,
    pub to_party: PartyId,
    pub status: ShipmentStatus,
    pub shipment_date: DateTime<Utc>,
    /// Set exactly once, on delivery.
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub seal: Seal,
}

impl ShipmentRecord {
    pub fn request(
        crop_id: RecordId,
        from_party: PartyId,
        to_party: PartyId,
        salt: Salt,
    ) -> Result<Self, LedgerError> {
        let record = Self {
            id: RecordId::generate(),
            crop_id,
            from_party,
            to_party,
            status: ShipmentStatus::Pending,
            shipment_date: salt.timestamp,
            delivery_date: None,
            created_at: salt.timestamp,
            seal: unsealed(&salt),
        };
        record.validate_initial()?;
        record.sealed(salt)
    }

    /// A shipment enters the ledger pending, undelivered, between two parties.
    pub fn validate_initial(&self) -> Result<(), LedgerError> {
        require_initial(self.status.as_str(), ShipmentStatus::Pending.as_str())?;
        if self.delivery_date.is_some() {
            return Err(LedgerError::validation(
                "delivery_date",
                "set only on delivery",
            ));
        }
        if self.from_party == self.to_party {
            return Err(LedgerError::validation(
                "to_party",
                "sender and recipient must differ",
            ));
        }
        Ok(())
    }

    pub fn canonical_payload(&self) -> CanonicalPayload {
        CanonicalPayload::new(RecordKind::Shipment)
            .required("crop_id", self.crop_id)
            .required("from_party", self.from_party.as_str())
            .required("to_party", self.to_party.as_str())
            .required("shipment_date", self.shipment_date)
    }
}

impl_fingerprinted!(ShipmentRecord);

/// Retail stock derived from a delivered shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryListing {
    pub id: RecordId,
    pub crop_id: RecordId,
    pub shipment_id: RecordId,
    pub retailer_id: PartyId,
    pub allocated_quantity: FixedPoint,
    /// Only field that changes after creation; decremented by purchases.
    pub stock_quantity: FixedPoint,
    pub unit_price: FixedPoint,
    pub created_at: DateTime<Utc>,
    pub seal: Seal,
}

impl InventoryListing {
    pub fn open(
        shipment: &ShipmentRecord,
        allocated_quantity: FixedPoint,
        unit_price: FixedPoint,
        salt: Salt,
    ) -> Result<Self, LedgerError> {
        let record = Self {
            id: RecordId::generate(),
            crop_id: shipment.crop_id,
            shipment_id: shipment.id,
            retailer_id: shipment.to_party.clone(),
            allocated_quantity,
            stock_quantity: allocated_quantity,
            unit_price,
            created_at: salt.timestamp,
            seal: unsealed(&salt),
        };
        record.validate_initial()?;
        record.sealed(salt)
    }

    /// A listing opens with its full allocation in stock and a real price.
    pub fn validate_initial(&self) -> Result<(), LedgerError> {
        require_positive("allocated_quantity", self.allocated_quantity)?;
        require_positive("unit_price", self.unit_price)?;
        if self.stock_quantity != self.allocated_quantity {
            return Err(LedgerError::validation(
                "stock_quantity",
                format!(
                    "new listing must hold its allocation {}, holds {}",
                    self.allocated_quantity, self.stock_quantity
                ),
            ));
        }
        Ok(())
    }

    pub fn is_sold_out(&self) -> bool {
        self.stock_quantity.is_zero()
    }

    pub fn canonical_payload(&self) -> CanonicalPayload {
        CanonicalPayload::new(RecordKind::Listing)
            .required("crop_id", self.crop_id)
            .required("shipment_id", self.shipment_id)
            .required("retailer", self.retailer_id.as_str())
            .required("allocated_quantity", self.allocated_quantity)
            .required("unit_price", self.unit_price)
    }
}

impl_fingerprinted!(InventoryListing);

/// A customer's purchase against a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: RecordId,
    pub listing_id: RecordId,
    pub crop_id: RecordId,
    pub retailer_id: PartyId,
    pub customer_id: PartyId,
    pub quantity: FixedPoint,
    pub unit_price: FixedPoint,
    pub created_at: DateTime<Utc>,
    pub seal: Seal,
}

impl PurchaseRecord {
    pub fn against(
        listing: &InventoryListing,
        customer_id: PartyId,
        quantity: FixedPoint,
        salt: Salt,
    ) -> Result<Self, LedgerError> {
        let record = Self {
            id: RecordId::generate(),
            listing_id: listing.id,
            crop_id: listing.crop_id,
            retailer_id: listing.retailer_id.clone(),
            customer_id,
            quantity,
            unit_price: listing.unit_price,
            created_at: salt.timestamp,
            seal: unsealed(&salt),
        };
        record.validate_initial()?;
        record.sealed(salt)
    }

    pub fn validate_initial(&self) -> Result<(), LedgerError> {
        require_positive("quantity", self.quantity)?;
        require_positive("unit_price", self.unit_price)
    }

    pub fn canonical_payload(&self) -> CanonicalPayload {
        CanonicalPayload::new(RecordKind::Purchase)
            .required("listing_id", self.listing_id)
            .required("crop_id", self.crop_id)
            .required("retailer", self.retailer_id.as_str())
            .required("customer", self.customer_id.as_str())
            .required("quantity", self.quantity)
            .required("unit_price", self.unit_price)
    }
}

impl_fingerprinted!(PurchaseRecord);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub id: RecordId,
    pub author_id: PartyId,
    pub author_role: Role,
    pub title: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
    pub seal: Seal,
}

impl ComplaintRecord {
    pub fn file(
        author_id: PartyId,
        author_role: Role,
        draft: &NewComplaint,
        salt: Salt,
    ) -> Result<Self, LedgerError> {
        let record = Self {
            id: RecordId::generate(),
            author_id,
            author_role,
            title: draft.title.clone(),
            description: draft.description.clone(),
            status: ComplaintStatus::Pending,
            created_at: salt.timestamp,
            seal: unsealed(&salt),
        };
        record.validate_initial()?;
        record.sealed(salt)
    }

    pub fn validate_initial(&self) -> Result<(), LedgerError> {
        require_initial(self.status.as_str(), ComplaintStatus::Pending.as_str())?;
        NewComplaint {
            title: self.title.clone(),
            description: self.description.clone(),
        }
        .validate()
    }

    pub fn canonical_payload(&self) -> CanonicalPayload {
        CanonicalPayload::new(RecordKind::Complaint)
            .required("author", self.author_id.as_str())
            .required("role", self.author_role.as_str())
            .required("title", self.title.as_str())
            .required("description", self.description.as_str())
    }
}

impl_fingerprinted!(ComplaintRecord);

/// Any record the ledger stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerRecord {
    Crop(CropRecord),
    Shipment(ShipmentRecord),
    Listing(InventoryListing),
    Purchase(PurchaseRecord),
    Complaint(ComplaintRecord),
}

macro_rules! each_record {
    ($self:expr, $rec:ident => $body:expr) => {
        match $self {
            LedgerRecord::Crop($rec) => $body,
            LedgerRecord::Shipment($rec) => $body,
            LedgerRecord::Listing($rec) => $body,
            LedgerRecord::Purchase($rec) => $body,
            LedgerRecord::Complaint($rec) => $body,
        }
    };
}

impl LedgerRecord {
    pub fn id(&self) -> RecordId {
        each_record!(self, r => r.id)
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Crop(_) => RecordKind::Crop,
            Self::Shipment(_) => RecordKind::Shipment,
            Self::Listing(_) => RecordKind::Listing,
            Self::Purchase(_) => RecordKind::Purchase,
            Self::Complaint(_) => RecordKind::Complaint,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        each_record!(self, r => r.created_at)
    }

    pub fn seal(&self) -> &Seal {
        each_record!(self, r => &r.seal)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.seal().fingerprint
    }

    pub fn canonical_payload(&self) -> CanonicalPayload {
        each_record!(self, r => r.canonical_payload())
    }

    pub fn batch_number(&self) -> Option<&BatchNumber> {
        match self {
            Self::Crop(crop) => Some(&crop.batch_number),
            _ => None,
        }
    }

    /// Crop whose history this record belongs to.
    pub fn linked_crop(&self) -> Option<RecordId> {
        match self {
            Self::Crop(c) => Some(c.id),
            Self::Shipment(s) => Some(s.crop_id),
            Self::Listing(l) => Some(l.crop_id),
            Self::Purchase(p) => Some(p.crop_id),
            Self::Complaint(_) => None,
        }
    }

    /// Every party named by this record, with the role it plays here.
    pub fn parties(&self) -> Vec<(&PartyId, PartyRole)> {
        match self {
            Self::Crop(c) => vec![(&c.owner_id, PartyRole::Owner)],
            Self::Shipment(s) => vec![
                (&s.from_party, PartyRole::Sender),
                (&s.to_party, PartyRole::Recipient),
            ],
            Self::Listing(l) => vec![(&l.retailer_id, PartyRole::Retailer)],
            Self::Purchase(p) => vec![
                (&p.retailer_id, PartyRole::Retailer),
                (&p.customer_id, PartyRole::Customer),
            ],
            Self::Complaint(c) => vec![(&c.author_id, PartyRole::Author)],
        }
    }

    pub fn involves(&self, party: &PartyId, role: Option<PartyRole>) -> bool {
        self.parties()
            .into_iter()
            .any(|(p, r)| p == party && role.map_or(true, |want| want == r))
    }

    /// Keys the store must keep unique across all records.
    pub fn unique_keys(&self) -> Vec<UniqueKey> {
        let mut keys = vec![UniqueKey::Id(self.id())];
        match self {
            Self::Crop(c) => keys.push(UniqueKey::BatchNumber(c.batch_number.clone())),
            Self::Shipment(s) if s.status.is_active() => {
                keys.push(UniqueKey::ActiveShipment(s.crop_id));
            }
            Self::Listing(l) => keys.push(UniqueKey::Listing {
                crop_id: l.crop_id,
                retailer: l.retailer_id.clone(),
            }),
            _ => {}
        }
        keys.push(UniqueKey::Fingerprint(self.fingerprint()));
        keys
    }

    /// Checks a record must pass before it is first stored: the status a
    /// constructor would give it and content the constructor would accept.
    pub fn validate_initial(&self) -> Result<(), LedgerError> {
        each_record!(self, r => r.validate_initial())
    }

    /// Current status label, for logs and events.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Crop(c) => c.status.as_str(),
            Self::Shipment(s) => s.status.as_str(),
            Self::Listing(l) if l.is_sold_out() => "closed",
            Self::Listing(_) => "open",
            Self::Purchase(_) => "recorded",
            Self::Complaint(c) => c.status.as_str(),
        }
    }

    pub fn as_crop(&self) -> Option<&CropRecord> {
        match self {
            Self::Crop(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_shipment(&self) -> Option<&ShipmentRecord> {
        match self {
            Self::Shipment(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_listing(&self) -> Option<&InventoryListing> {
        match self {
            Self::Listing(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_complaint(&self) -> Option<&ComplaintRecord> {
        match self {
            Self::Complaint(c) => Some(c),
            _ => None,
        }
    }
}

impl From<CropRecord> for LedgerRecord {
    fn from(value: CropRecord) -> Self {
        Self::Crop(value)
    }
}

impl From<ShipmentRecord> for LedgerRecord {
    fn from(value: ShipmentRecord) -> Self {
        Self::Shipment(value)
    }
}

impl From<InventoryListing> for LedgerRecord {
    fn from(value: InventoryListing) -> Self {
        Self::Listing(value)
    }
}

impl From<PurchaseRecord> for LedgerRecord {
    fn from(value: PurchaseRecord) -> Self {
        Self::Purchase(value)
    }
}

impl From<ComplaintRecord> for LedgerRecord {
    fn from(value: ComplaintRecord) -> Self {
        Self::Complaint(value)
    }
}

// =============================================================================
// CLUSTER C: DRAFTS
// =============================================================================

/// Content a farmer supplies when registering a harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCrop {
    pub crop_name: String,
    pub crop_type: CropType,
    pub quantity: FixedPoint,
    pub price_per_unit: FixedPoint,
    pub sowing_date: Option<NaiveDate>,
    pub harvest_date: Option<NaiveDate>,
}

impl NewCrop {
    pub fn validate(&self) -> Result<(), LedgerError> {
        check_harvest(
            &self.crop_name,
            self.quantity,
            self.sowing_date,
            self.harvest_date,
        )
    }
}

/// Transport request from the crop owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShipment {
    pub crop_id: RecordId,
    pub to_party: PartyId,
}

/// Retailer's request to list a delivered shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    pub shipment_id: RecordId,
    pub allocated_quantity: FixedPoint,
    /// Defaults to the crop's unit price plus the configured markup.
    pub unit_price: Option<FixedPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub listing_id: RecordId,
    pub quantity: FixedPoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
}

impl NewComplaint {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.title.trim().is_empty() {
            return Err(LedgerError::validation("title", "must not be blank"));
        }
        if self.description.trim().is_empty() {
            return Err(LedgerError::validation("description", "must not be blank"));
        }
        Ok(())
    }
}

// =============================================================================
// CLUSTER D: INDEXING
// =============================================================================

/// Role a party plays within one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Owner,
    Sender,
    Recipient,
    Retailer,
    Customer,
    Author,
}

/// Keys held unique by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UniqueKey {
    Id(RecordId),
    BatchNumber(BatchNumber),
    Fingerprint(Fingerprint),
    /// At most one pending or in-transit shipment per crop.
    ActiveShipment(RecordId),
    /// One listing per (crop, retailer).
    Listing { crop_id: RecordId, retailer: PartyId },
}

impl UniqueKey {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::BatchNumber(_) => "batch_number",
            Self::Fingerprint(_) => "fingerprint",
            Self::ActiveShipment(_) => "active_shipment",
            Self::Listing { .. } => "listing",
        }
    }

    pub fn value(&self) -> String {
        match self {
            Self::Id(id) | Self::ActiveShipment(id) => id.to_string(),
            Self::BatchNumber(batch) => batch.to_string(),
            Self::Fingerprint(fp) => fp.to_hex(),
            Self::Listing { crop_id, retailer } => format!("{crop_id}/{retailer}"),
        }
    }
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field(), self.value())
    }
}
