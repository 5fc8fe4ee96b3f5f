//! Transition rules
//!
//! Pure checks over already-loaded records. They decide whether a status change
//! is legal and which linked changes ride along with it; the application layer
//! applies the result as one conditional, atomic write.

use crate::domain::errors::{LedgerError, TransitionRejection};
use crate::domain::records::{
    ComplaintRecord, ComplaintStatus, CropRecord, CropStatus, ShipmentRecord, ShipmentStatus,
};
use chrono::{DateTime, Utc};
use shared_types::{PartyId, RecordId};

/// A planned crop status change, guarded by the status it was read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropCascade {
    pub crop_id: RecordId,
    pub from: CropStatus,
    pub to: CropStatus,
}

/// A legal shipment transition and its side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentTransition {
    pub shipment_id: RecordId,
    pub crop_id: RecordId,
    pub from: ShipmentStatus,
    pub to: ShipmentStatus,
    pub delivery_date: Option<DateTime<Utc>>,
    pub crop_cascade: Option<CropCascade>,
}

fn rejected(
    record_id: RecordId,
    from: &str,
    to: &str,
    reason: TransitionRejection,
) -> LedgerError {
    LedgerError::IllegalTransition {
        record_id,
        from: from.to_string(),
        to: to.to_string(),
        reason,
    }
}

/// Decide whether `actor` may move `shipment` to `target`.
///
/// - `pending → in_transit`: sender only; crop must still be dispatchable
/// - `pending → rejected`: recipient only
/// - `in_transit → delivered`: recipient only; stamps the delivery date and
///   moves the crop to `delivered` unless it is already verified
pub fn plan_shipment_transition(
    shipment: &ShipmentRecord,
    crop: &CropRecord,
    actor: &PartyId,
    target: ShipmentStatus,
    now: DateTime<Utc>,
) -> Result<ShipmentTransition, LedgerError> {
    let from = shipment.status;
    let reject = |reason| rejected(shipment.id, from.as_str(), target.as_str(), reason);

    if !from.can_transition_to(target) {
        return Err(reject(TransitionRejection::UndefinedEdge));
    }

    let permitted_party = match target {
        ShipmentStatus::InTransit => &shipment.from_party,
        _ => &shipment.to_party,
    };
    if actor != permitted_party {
        return Err(reject(TransitionRejection::NotPermitted {
            actor: actor.to_string(),
        }));
    }

    let mut plan = ShipmentTransition {
        shipment_id: shipment.id,
        crop_id: shipment.crop_id,
        from,
        to: target,
        delivery_date: None,
        crop_cascade: None,
    };

    match target {
        ShipmentStatus::InTransit if !crop.status.is_dispatchable() => {
            return Err(reject(TransitionRejection::CropNotEligible {
                crop_status: crop.status.to_string(),
            }));
        }
        ShipmentStatus::Delivered => {
            plan.delivery_date = Some(now);
            if crop.status.can_transition_to(CropStatus::Delivered) {
                plan.crop_cascade = Some(CropCascade {
                    crop_id: crop.id,
                    from: crop.status,
                    to: CropStatus::Delivered,
                });
            }
        }
        _ => {}
    }

    Ok(plan)
}

/// Check that `owner` may request a shipment of `crop` to `to_party`.
pub fn check_shipment_request(
    crop: &CropRecord,
    owner: &PartyId,
    to_party: &PartyId,
) -> Result<(), LedgerError> {
    if &crop.owner_id != owner {
        return Err(LedgerError::forbidden(
            "request shipment",
            format!("{owner} does not own crop {}", crop.id),
        ));
    }
    if to_party.is_blank() {
        return Err(LedgerError::validation("to_party", "must not be blank"));
    }
    if to_party == owner {
        return Err(LedgerError::validation(
            "to_party",
            "cannot ship a crop to its own owner",
        ));
    }
    if !crop.status.is_dispatchable() {
        return Err(rejected(
            crop.id,
            crop.status.as_str(),
            ShipmentStatus::Pending.as_str(),
            TransitionRejection::CropNotEligible {
                crop_status: crop.status.to_string(),
            },
        ));
    }
    Ok(())
}

/// `None` when the crop is already verified.
pub fn plan_crop_verification(crop: &CropRecord) -> Result<Option<CropCascade>, LedgerError> {
    if crop.status == CropStatus::Verified {
        return Ok(None);
    }
    if !crop.status.can_transition_to(CropStatus::Verified) {
        return Err(rejected(
            crop.id,
            crop.status.as_str(),
            CropStatus::Verified.as_str(),
            TransitionRejection::UndefinedEdge,
        ));
    }
    Ok(Some(CropCascade {
        crop_id: crop.id,
        from: crop.status,
        to: CropStatus::Verified,
    }))
}

pub fn plan_complaint_resolution(complaint: &ComplaintRecord) -> Result<(), LedgerError> {
    if complaint.status.can_transition_to(ComplaintStatus::Resolved) {
        return Ok(());
    }
    Err(rejected(
        complaint.id,
        complaint.status.as_str(),
        ComplaintStatus::Resolved.as_str(),
        TransitionRejection::UndefinedEdge,
    ))
}
