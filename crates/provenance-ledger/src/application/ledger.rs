//! Ledger Service
//!
//! Append-only storage, lookups, and the role-gated write paths that create
//! records: crop registration, shipment requests, listings, purchases and
//! complaints.

use crate::application::context::{store_error, LedgerContext};
use crate::domain::{
    is_well_formed, plan_complaint_resolution, check_shipment_request, BatchNumber,
    ComplaintRecord, ComplaintStatus, CropRecord, CropTrace, Fingerprint, InventoryListing,
    LedgerError, LedgerRecord, NewComplaint, NewCrop, NewListing, NewPurchase, NewShipment,
    PartyRole, PurchaseRecord, ShipmentRecord, ShipmentStatus, TransitionRejection, UniqueKey,
    BATCH_TOKEN_LEN,
};
use crate::ports::inbound::{LedgerStoreApi, SupplyChainApi};
use crate::ports::outbound::{RecordFilter, RecordStore, RecordUpdate, StoreError, WriteOp};
use async_trait::async_trait;
use shared_bus::LedgerEvent;
use shared_types::{CallerIdentity, PartyId, RecordId, Role};
use tracing::{debug, info, warn};

fn require_role(caller: &CallerIdentity, role: Role, action: &'static str) -> Result<(), LedgerError> {
    if caller.role == role {
        return Ok(());
    }
    warn!(caller = %caller.id, role = %caller.role, action, "Role check failed");
    Err(LedgerError::forbidden(
        action,
        format!("requires role {role}, caller is {}", caller.role),
    ))
}

/// Ledger Service
///
/// Every record leaves this service sealed: the fingerprint is computed over
/// the canonical payload before the record reaches the store.
pub struct LedgerService<S> {
    ctx: LedgerContext<S>,
}

impl<S> Clone for LedgerService<S> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
        }
    }
}

impl<S: RecordStore + 'static> LedgerService<S> {
    pub fn new(ctx: LedgerContext<S>) -> Self {
        Self { ctx }
    }

    async fn register_with_retry(
        &self,
        owner: &PartyId,
        draft: &NewCrop,
    ) -> Result<CropRecord, LedgerError> {
        let attempts = self.ctx.config.batch_number_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let salt = self.ctx.salt();
            let batch = BatchNumber::compose(
                &self.ctx.entropy.base36(BATCH_TOKEN_LEN),
                salt.timestamp.date_naive(),
            )?;
            let crop = CropRecord::register(owner.clone(), draft, batch, salt)?;

            match self.append(crop.clone().into()).await {
                Ok(_) => return Ok(crop),
                Err(LedgerError::DuplicateKey {
                    field: "batch_number",
                    value,
                }) if attempt < attempts => {
                    warn!(batch_number = %value, attempt, "Batch number collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<S: RecordStore + 'static> LedgerStoreApi for LedgerService<S> {
    async fn append(&self, record: LedgerRecord) -> Result<LedgerRecord, LedgerError> {
        record.validate_initial()?;
        let payload = record.canonical_payload();
        let recomputed = record.seal().recompute(&payload)?;
        if recomputed != record.fingerprint() {
            return Err(LedgerError::validation(
                "fingerprint",
                "seal does not match record content",
            ));
        }

        self.ctx
            .submit("append", vec![WriteOp::Insert(record.clone())])
            .await
            .map_err(|e| store_error("append", e))?;

        debug!(
            record_id = %record.id(),
            kind = %record.kind(),
            fingerprint = %record.fingerprint().short(),
            "Record appended"
        );
        Ok(record)
    }

    async fn get_by_id(&self, id: RecordId) -> Result<LedgerRecord, LedgerError> {
        self.ctx
            .get(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("record", id))
    }

    async fn find_by_batch_or_hash(
        &self,
        token: &str,
    ) -> Result<Option<LedgerRecord>, LedgerError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(LedgerError::validation("token", "must not be blank"));
        }

        let filter = if let Ok(batch) = token.parse::<BatchNumber>() {
            RecordFilter::BatchNumber(batch)
        } else if is_well_formed(token) {
            RecordFilter::Fingerprint(Fingerprint::from_hex(token)?)
        } else {
            debug!(token, "Token is neither a batch number nor a fingerprint");
            return Ok(None);
        };

        Ok(self.ctx.find(&filter).await?.into_iter().next())
    }

    async fn list_by_party(
        &self,
        party: &PartyId,
        role: Option<PartyRole>,
    ) -> Result<Vec<LedgerRecord>, LedgerError> {
        let mut records = self
            .ctx
            .find(&RecordFilter::Party {
                party: party.clone(),
                role,
            })
            .await?;

        records.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(records)
    }

    async fn trace_crop(&self, crop_id: RecordId) -> Result<CropTrace, LedgerError> {
        let crop = self.ctx.get_crop(crop_id).await?;
        let linked = self.ctx.find(&RecordFilter::Crop(crop_id)).await?;
        Ok(CropTrace::assemble(crop, linked))
    }
}

#[async_trait]
impl<S: RecordStore + 'static> SupplyChainApi for LedgerService<S> {
    async fn register_crop(
        &self,
        caller: &CallerIdentity,
        draft: NewCrop,
    ) -> Result<CropRecord, LedgerError> {
        require_role(caller, Role::Farmer, "register crop")?;
        draft.validate()?;

        let crop = self.register_with_retry(&caller.id, &draft).await?;

        info!(
            crop_id = %crop.id,
            batch_number = %crop.batch_number,
            owner = %crop.owner_id,
            fingerprint = %crop.seal.fingerprint.short(),
            "[ledger] Crop registered"
        );
        self.ctx
            .publish(LedgerEvent::CropRegistered {
                crop_id: crop.id,
                owner: crop.owner_id.clone(),
                batch_number: crop.batch_number.to_string(),
                fingerprint: crop.seal.fingerprint.to_hex(),
            })
            .await;

        Ok(crop)
    }

    async fn request_shipment(
        &self,
        caller: &CallerIdentity,
        request: NewShipment,
    ) -> Result<ShipmentRecord, LedgerError> {
        let crop = self.ctx.get_crop(request.crop_id).await?;
        check_shipment_request(&crop, &caller.id, &request.to_party)?;

        let shipment =
            ShipmentRecord::request(crop.id, caller.id.clone(), request.to_party, self.ctx.salt())?;

        match self
            .ctx
            .submit("request_shipment", vec![WriteOp::Insert(shipment.clone().into())])
            .await
        {
            Ok(()) => {}
            Err(StoreError::UniqueViolation(UniqueKey::ActiveShipment(crop_id))) => {
                return Err(LedgerError::IllegalTransition {
                    record_id: crop_id,
                    from: crop.status.to_string(),
                    to: ShipmentStatus::Pending.to_string(),
                    reason: TransitionRejection::ActiveShipmentExists,
                });
            }
            Err(e) => return Err(store_error("request_shipment", e)),
        }

        info!(
            shipment_id = %shipment.id,
            crop_id = %shipment.crop_id,
            from = %shipment.from_party,
            to = %shipment.to_party,
            "[ledger] Shipment requested"
        );
        self.ctx
            .publish(LedgerEvent::ShipmentRequested {
                shipment_id: shipment.id,
                crop_id: shipment.crop_id,
                from_party: shipment.from_party.clone(),
                to_party: shipment.to_party.clone(),
            })
            .await;

        Ok(shipment)
    }

    async fn create_listing(
        &self,
        caller: &CallerIdentity,
        request: NewListing,
    ) -> Result<InventoryListing, LedgerError> {
        require_role(caller, Role::Retailer, "create listing")?;

        let shipment = self.ctx.get_shipment(request.shipment_id).await?;
        if shipment.to_party != caller.id {
            return Err(LedgerError::forbidden(
                "create listing",
                format!("shipment {} was not sent to {}", shipment.id, caller.id),
            ));
        }
        if shipment.status != ShipmentStatus::Delivered {
            return Err(LedgerError::validation(
                "shipment_id",
                format!("shipment is {}, not delivered", shipment.status),
            ));
        }

        let crop = self.ctx.get_crop(shipment.crop_id).await?;
        let allocated = request.allocated_quantity;
        if allocated.is_zero() || allocated > crop.quantity {
            return Err(LedgerError::validation(
                "allocated_quantity",
                format!("must be within (0, {}]", crop.quantity),
            ));
        }

        let unit_price = match request.unit_price {
            Some(price) => price,
            None => crop
                .price_per_unit
                .with_markup(self.ctx.config.listing_markup_percent)
                .ok_or_else(|| LedgerError::validation("unit_price", "default price overflows"))?,
        };
        if unit_price.is_zero() {
            return Err(LedgerError::validation("unit_price", "must be greater than zero"));
        }

        let listing = InventoryListing::open(&shipment, allocated, unit_price, self.ctx.salt())?;
        self.ctx
            .submit("create_listing", vec![WriteOp::Insert(listing.clone().into())])
            .await
            .map_err(|e| store_error("create_listing", e))?;

        info!(
            listing_id = %listing.id,
            crop_id = %listing.crop_id,
            retailer = %listing.retailer_id,
            stock = %listing.stock_quantity,
            unit_price = %listing.unit_price,
            "[ledger] Listing created"
        );
        self.ctx
            .publish(LedgerEvent::ListingCreated {
                listing_id: listing.id,
                crop_id: listing.crop_id,
                retailer: listing.retailer_id.clone(),
            })
            .await;

        Ok(listing)
    }

    async fn record_purchase(
        &self,
        caller: &CallerIdentity,
        request: NewPurchase,
    ) -> Result<PurchaseRecord, LedgerError> {
        require_role(caller, Role::Customer, "record purchase")?;

        let listing = self.ctx.get_listing(request.listing_id).await?;
        if request.quantity.is_zero() {
            return Err(LedgerError::validation("quantity", "must be greater than zero"));
        }
        let remaining = listing
            .stock_quantity
            .checked_sub(request.quantity)
            .ok_or_else(|| {
                LedgerError::validation(
                    "quantity",
                    format!(
                        "requested {} exceeds available stock {}",
                        request.quantity, listing.stock_quantity
                    ),
                )
            })?;

        let purchase =
            PurchaseRecord::against(&listing, caller.id.clone(), request.quantity, self.ctx.salt())?;

        let ops = vec![
            WriteOp::Update(RecordUpdate::Stock {
                id: listing.id,
                expected: listing.stock_quantity,
                next: remaining,
            }),
            WriteOp::Insert(purchase.clone().into()),
        ];
        match self.ctx.submit("record_purchase", ops).await {
            Ok(()) => {}
            Err(StoreError::PreconditionFailed { id, actual, .. }) => {
                return Err(LedgerError::IllegalTransition {
                    record_id: id,
                    from: listing.stock_quantity.to_string(),
                    to: remaining.to_string(),
                    reason: TransitionRejection::StaleState { observed: actual },
                });
            }
            Err(e) => return Err(store_error("record_purchase", e)),
        }

        info!(
            purchase_id = %purchase.id,
            listing_id = %listing.id,
            customer = %purchase.customer_id,
            quantity = %purchase.quantity,
            remaining = %remaining,
            "[ledger] Purchase recorded"
        );
        self.ctx
            .publish(LedgerEvent::PurchaseRecorded {
                purchase_id: purchase.id,
                listing_id: listing.id,
                remaining_stock: remaining.to_string(),
            })
            .await;

        Ok(purchase)
    }

    async fn file_complaint(
        &self,
        caller: &CallerIdentity,
        complaint: NewComplaint,
    ) -> Result<ComplaintRecord, LedgerError> {
        complaint.validate()?;

        let record =
            ComplaintRecord::file(caller.id.clone(), caller.role, &complaint, self.ctx.salt())?;
        self.append(record.clone().into()).await?;

        info!(complaint_id = %record.id, author = %record.author_id, "[ledger] Complaint filed");
        self.ctx
            .publish(LedgerEvent::ComplaintFiled {
                complaint_id: record.id,
                author: record.author_id.clone(),
            })
            .await;

        Ok(record)
    }

    async fn resolve_complaint(
        &self,
        caller: &CallerIdentity,
        complaint_id: RecordId,
    ) -> Result<ComplaintRecord, LedgerError> {
        require_role(caller, Role::Admin, "resolve complaint")?;

        let mut complaint = self.ctx.get_complaint(complaint_id).await?;
        plan_complaint_resolution(&complaint)?;

        let update = RecordUpdate::Complaint {
            id: complaint.id,
            expected: complaint.status,
            next: ComplaintStatus::Resolved,
        };
        self.ctx
            .submit("resolve_complaint", vec![WriteOp::Update(update)])
            .await
            .map_err(|e| match e {
                StoreError::PreconditionFailed { id, actual, .. } => LedgerError::IllegalTransition {
                    record_id: id,
                    from: ComplaintStatus::Pending.to_string(),
                    to: ComplaintStatus::Resolved.to_string(),
                    reason: TransitionRejection::StaleState { observed: actual },
                },
                other => store_error("resolve_complaint", other),
            })?;

        complaint.status = ComplaintStatus::Resolved;
        info!(complaint_id = %complaint.id, admin = %caller.id, "[ledger] Complaint resolved");
        self.ctx
            .publish(LedgerEvent::ComplaintResolved {
                complaint_id: complaint.id,
            })
            .await;

        Ok(complaint)
    }
}
