//! Read models returned to callers

use crate::domain::fingerprint::Fingerprint;
use crate::domain::records::{
    CropRecord, InventoryListing, LedgerRecord, PurchaseRecord, ShipmentRecord, ShipmentStatus,
};
use crate::domain::value_objects::FixedPoint;
use serde::{Deserialize, Serialize};
use shared_types::PartyId;

/// A crop and everything recorded downstream of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropTrace {
    pub crop: CropRecord,
    /// Oldest first.
    pub shipments: Vec<ShipmentRecord>,
    pub listings: Vec<InventoryListing>,
    pub purchases: Vec<PurchaseRecord>,
}

impl CropTrace {
    /// Assemble from the unordered records linked to `crop`.
    pub fn assemble(crop: CropRecord, linked: Vec<LedgerRecord>) -> Self {
        let mut trace = Self {
            crop,
            shipments: Vec::new(),
            listings: Vec::new(),
            purchases: Vec::new(),
        };
        for record in linked {
            match record {
                LedgerRecord::Shipment(s) => trace.shipments.push(s),
                LedgerRecord::Listing(l) => trace.listings.push(l),
                LedgerRecord::Purchase(p) => trace.purchases.push(p),
                LedgerRecord::Crop(_) | LedgerRecord::Complaint(_) => {}
            }
        }
        trace
            .shipments
            .sort_by(|a, b| a.shipment_date.cmp(&b.shipment_date).then(a.id.cmp(&b.id)));
        trace
            .listings
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        trace
            .purchases
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        trace
    }

    /// Recipient of the latest delivered shipment, or the owner if none.
    pub fn current_holder(&self) -> &PartyId {
        self.shipments
            .iter()
            .rev()
            .find(|s| s.status == ShipmentStatus::Delivered)
            .map_or(&self.crop.owner_id, |s| &s.to_party)
    }

    /// Sum of purchased quantities, or `None` if it does not fit a `FixedPoint`.
    pub fn total_sold(&self) -> Option<FixedPoint> {
        self.purchases
            .iter()
            .try_fold(FixedPoint::ZERO, |acc, p| acc.checked_add(p.quantity))
    }
}

/// Evidence attached to a failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TamperEvidence {
    pub stored: Fingerprint,
    /// `None` when the stored content no longer even forms a valid payload.
    pub recomputed: Option<Fingerprint>,
}

/// Outcome of verifying a batch number or fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub token: String,
    pub found: bool,
    pub authentic: bool,
    pub record: Option<LedgerRecord>,
    /// This call moved the crop to `verified`.
    pub newly_verified: bool,
    pub tamper: Option<TamperEvidence>,
}

impl VerificationReport {
    pub fn not_found(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            found: false,
            authentic: false,
            record: None,
            newly_verified: false,
            tamper: None,
        }
    }

    pub fn authentic(token: impl Into<String>, record: LedgerRecord, newly_verified: bool) -> Self {
        Self {
            token: token.into(),
            found: true,
            authentic: true,
            record: Some(record),
            newly_verified,
            tamper: None,
        }
    }

    pub fn tampered(token: impl Into<String>, record: LedgerRecord, evidence: TamperEvidence) -> Self {
        Self {
            token: token.into(),
            found: true,
            authentic: false,
            record: Some(record),
            newly_verified: false,
            tamper: Some(evidence),
        }
    }

    /// Short fingerprint for printed receipts, when the record is authentic.
    pub fn receipt(&self) -> Option<String> {
        match (&self.record, self.authentic) {
            (Some(record), true) => Some(record.fingerprint().short()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::tests::{rice_draft, salt_at};
    use crate::domain::value_objects::BatchNumber;
    use chrono::NaiveDate;

    fn trace_with_sales(quantities: &[FixedPoint]) -> CropTrace {
        let batch =
            BatchNumber::compose("K3X9Q2ZA", NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
                .unwrap();
        let crop = CropRecord::register(PartyId::new("farmer-1"), &rice_draft(), batch, salt_at(8))
            .unwrap();
        let shipment = ShipmentRecord::request(
            crop.id,
            PartyId::new("farmer-1"),
            PartyId::new("retailer-1"),
            salt_at(9),
        )
        .unwrap();
        let listing = InventoryListing::open(
            &shipment,
            FixedPoint::from_units(500).unwrap(),
            FixedPoint::from_units(3).unwrap(),
            salt_at(10),
        )
        .unwrap();
        let linked: Vec<LedgerRecord> = quantities
            .iter()
            .map(|&qty| {
                PurchaseRecord::against(&listing, PartyId::new("customer-1"), qty, salt_at(11))
                    .unwrap()
                    .into()
            })
            .collect();
        CropTrace::assemble(crop, linked)
    }

    #[test]
    fn test_total_sold_sums_purchases() {
        let trace = trace_with_sales(&[
            FixedPoint::from_units(20).unwrap(),
            "2.5".parse().unwrap(),
        ]);
        assert_eq!(trace.total_sold(), Some("22.5".parse().unwrap()));
        assert_eq!(trace_with_sales(&[]).total_sold(), Some(FixedPoint::ZERO));
    }

    #[test]
    fn test_total_sold_overflow_is_none() {
        let half = FixedPoint::from_milli(u64::MAX / 2 + 1);
        assert_eq!(trace_with_sales(&[half]).total_sold(), Some(half));
        assert_eq!(trace_with_sales(&[half, half]).total_sold(), None);
    }
}
