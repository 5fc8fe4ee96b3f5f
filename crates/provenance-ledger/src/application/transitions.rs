//! Transition Service
//!
//! Applies planned status changes as conditional writes. Two callers racing on
//! the same record both read the old state, both pass the rules, and exactly
//! one commit matches the guard; the other gets `StaleState`.

use crate::application::context::{store_error, LedgerContext};
use crate::domain::{
    plan_crop_verification, plan_shipment_transition, CropStatus, LedgerError, ShipmentRecord,
    ShipmentStatus, ShipmentTransition, TransitionRejection,
};
use crate::ports::inbound::TransitionApi;
use crate::ports::outbound::{RecordStore, RecordUpdate, StoreError, WriteOp};
use async_trait::async_trait;
use shared_bus::LedgerEvent;
use shared_types::{CallerIdentity, RecordId};
use tracing::{debug, info};

/// Re-reads allowed when verification loses a race.
const VERIFY_ATTEMPTS: u32 = 2;

/// Re-plans allowed when only the crop cascade of a shipment transition is stale.
const CASCADE_ATTEMPTS: u32 = 2;

fn shipment_ops(plan: &ShipmentTransition) -> Vec<WriteOp> {
    let mut ops = vec![WriteOp::Update(RecordUpdate::Shipment {
        id: plan.shipment_id,
        expected: plan.from,
        next: plan.to,
        delivery_date: plan.delivery_date,
    })];
    if let Some(cascade) = plan.crop_cascade {
        ops.push(WriteOp::Update(RecordUpdate::Crop {
            id: cascade.crop_id,
            expected: cascade.from,
            next: cascade.to,
        }));
    }
    ops
}

pub struct TransitionService<S> {
    ctx: LedgerContext<S>,
}

impl<S> Clone for TransitionService<S> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
        }
    }
}

impl<S: RecordStore + 'static> TransitionService<S> {
    pub fn new(ctx: LedgerContext<S>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<S: RecordStore + 'static> TransitionApi for TransitionService<S> {
    async fn transition_shipment(
        &self,
        caller: &CallerIdentity,
        shipment_id: RecordId,
        target: ShipmentStatus,
    ) -> Result<ShipmentRecord, LedgerError> {
        let mut attempt = 0;

        // A crop verified between our read and the commit fails only the
        // cascade guard. Re-plan against the fresh crop, which drops the cascade.
        let (shipment, plan) = loop {
            attempt += 1;
            let shipment = self.ctx.get_shipment(shipment_id).await?;
            let crop = self.ctx.get_crop(shipment.crop_id).await?;
            let plan = plan_shipment_transition(
                &shipment,
                &crop,
                &caller.id,
                target,
                self.ctx.clock.now(),
            )?;

            match self
                .ctx
                .submit("transition_shipment", shipment_ops(&plan))
                .await
            {
                Ok(()) => break (shipment, plan),
                Err(StoreError::PreconditionFailed { id, actual, .. })
                    if id == plan.crop_id && attempt < CASCADE_ATTEMPTS =>
                {
                    debug!(shipment_id = %shipment_id, crop_id = %id, observed = %actual, attempt, "Crop changed under shipment transition, re-planning");
                }
                Err(StoreError::PreconditionFailed { id, actual, .. }) => {
                    debug!(shipment_id = %shipment_id, conflicting = %id, observed = %actual, "Lost transition race");
                    return Err(LedgerError::IllegalTransition {
                        record_id: id,
                        from: plan.from.to_string(),
                        to: plan.to.to_string(),
                        reason: TransitionRejection::StaleState { observed: actual },
                    });
                }
                Err(e) => return Err(store_error("transition_shipment", e)),
            }
        };

        info!(
            shipment_id = %plan.shipment_id,
            crop_id = %plan.crop_id,
            from = %plan.from,
            to = %plan.to,
            actor = %caller.id,
            "[ledger] Shipment transitioned"
        );
        self.ctx
            .publish(LedgerEvent::ShipmentTransitioned {
                shipment_id: plan.shipment_id,
                crop_id: plan.crop_id,
                from: plan.from.to_string(),
                to: plan.to.to_string(),
            })
            .await;
        if let Some(cascade) = plan.crop_cascade {
            self.ctx
                .publish(LedgerEvent::CropStatusChanged {
                    crop_id: cascade.crop_id,
                    from: cascade.from.to_string(),
                    to: cascade.to.to_string(),
                })
                .await;
        }

        let mut updated = shipment;
        updated.status = plan.to;
        if updated.delivery_date.is_none() {
            updated.delivery_date = plan.delivery_date;
        }
        Ok(updated)
    }

    async fn mark_crop_verified(&self, crop_id: RecordId) -> Result<bool, LedgerError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let crop = self.ctx.get_crop(crop_id).await?;
            let Some(cascade) = plan_crop_verification(&crop)? else {
                return Ok(false);
            };

            let update = RecordUpdate::Crop {
                id: crop_id,
                expected: cascade.from,
                next: CropStatus::Verified,
            };
            match self
                .ctx
                .submit("mark_crop_verified", vec![WriteOp::Update(update)])
                .await
            {
                Ok(()) => {
                    info!(crop_id = %crop_id, from = %cascade.from, "[verify] Crop marked verified");
                    self.ctx
                        .publish(LedgerEvent::CropStatusChanged {
                            crop_id,
                            from: cascade.from.to_string(),
                            to: CropStatus::Verified.to_string(),
                        })
                        .await;
                    return Ok(true);
                }
                Err(StoreError::PreconditionFailed { .. }) if attempt < VERIFY_ATTEMPTS => {
                    debug!(crop_id = %crop_id, attempt, "Crop changed during verification, re-reading");
                }
                Err(StoreError::PreconditionFailed { id, actual, .. }) => {
                    return Err(LedgerError::IllegalTransition {
                        record_id: id,
                        from: cascade.from.to_string(),
                        to: CropStatus::Verified.to_string(),
                        reason: TransitionRejection::StaleState { observed: actual },
                    });
                }
                Err(e) => return Err(store_error("mark_crop_verified", e)),
            }
        }
    }
}
