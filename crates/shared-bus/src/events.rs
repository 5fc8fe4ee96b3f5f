//! # Ledger Events
//!
//! Every event that flows through the change feed. Statuses travel as their
//! wire labels (`"in_transit"`, `"delivered"`, ...) so the bus does not depend
//! on the ledger crate.

use serde::{Deserialize, Serialize};
use shared_types::{PartyId, RecordId, RecordKind};

/// All events that can be published to the change feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    // =========================================================================
    // CROPS
    // =========================================================================
    /// A harvest lot was registered.
    CropRegistered {
        crop_id: RecordId,
        owner: PartyId,
        batch_number: String,
        fingerprint: String,
    },

    /// A crop status changed as a side effect of a shipment or verification.
    CropStatusChanged {
        crop_id: RecordId,
        from: String,
        to: String,
    },

    // =========================================================================
    // SHIPMENTS
    // =========================================================================
    /// The crop owner requested transport.
    ShipmentRequested {
        shipment_id: RecordId,
        crop_id: RecordId,
        from_party: PartyId,
        to_party: PartyId,
    },

    /// A shipment moved along its state machine.
    ShipmentTransitioned {
        shipment_id: RecordId,
        crop_id: RecordId,
        from: String,
        to: String,
    },

    // =========================================================================
    // RETAIL
    // =========================================================================
    /// A retailer turned a delivered shipment into a sellable listing.
    ListingCreated {
        listing_id: RecordId,
        crop_id: RecordId,
        retailer: PartyId,
    },

    /// Stock was sold from a listing.
    PurchaseRecorded {
        purchase_id: RecordId,
        listing_id: RecordId,
        remaining_stock: String,
    },

    // =========================================================================
    // COMPLAINTS
    // =========================================================================
    ComplaintFiled {
        complaint_id: RecordId,
        author: PartyId,
    },

    ComplaintResolved {
        complaint_id: RecordId,
    },

    // =========================================================================
    // AUDIT
    // =========================================================================
    /// Recomputing a record's fingerprint did not reproduce the stored one.
    TamperDetected {
        record_id: RecordId,
        kind: RecordKind,
        stored: String,
        recomputed: String,
    },
}

impl LedgerEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::CropRegistered { .. } | Self::CropStatusChanged { .. } => EventTopic::Crops,
            Self::ShipmentRequested { .. } | Self::ShipmentTransitioned { .. } => {
                EventTopic::Shipments
            }
            Self::ListingCreated { .. } | Self::PurchaseRecorded { .. } => EventTopic::Retail,
            Self::ComplaintFiled { .. } | Self::ComplaintResolved { .. } => {
                EventTopic::Complaints
            }
            Self::TamperDetected { .. } => EventTopic::Audit,
        }
    }

    /// The record the event is about.
    #[must_use]
    pub fn record_id(&self) -> RecordId {
        match self {
            Self::CropRegistered { crop_id, .. } | Self::CropStatusChanged { crop_id, .. } => {
                *crop_id
            }
            Self::ShipmentRequested { shipment_id, .. }
            | Self::ShipmentTransitioned { shipment_id, .. } => *shipment_id,
            Self::ListingCreated { listing_id, .. } => *listing_id,
            Self::PurchaseRecorded { purchase_id, .. } => *purchase_id,
            Self::ComplaintFiled { complaint_id, .. }
            | Self::ComplaintResolved { complaint_id } => *complaint_id,
            Self::TamperDetected { record_id, .. } => *record_id,
        }
    }

    /// The crop this event concerns, when it concerns one.
    #[must_use]
    pub fn crop_id(&self) -> Option<RecordId> {
        match self {
            Self::CropRegistered { crop_id, .. }
            | Self::CropStatusChanged { crop_id, .. }
            | Self::ShipmentRequested { crop_id, .. }
            | Self::ShipmentTransitioned { crop_id, .. }
            | Self::ListingCreated { crop_id, .. } => Some(*crop_id),
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Crops,
    Shipments,
    /// Listings and purchases.
    Retail,
    Complaints,
    /// Tamper reports.
    Audit,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Restrict to events touching these crops. Empty means all crops.
    pub crop_ids: Vec<RecordId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            crop_ids: Vec::new(),
        }
    }

    /// Create a filter following the history of specific crops.
    #[must_use]
    pub fn for_crops(crop_ids: Vec<RecordId>) -> Self {
        Self {
            topics: Vec::new(),
            crop_ids,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let crop_match = self.crop_ids.is_empty()
            || event
                .crop_id()
                .map(|id| self.crop_ids.contains(&id))
                .unwrap_or(false);

        topic_match && crop_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(crop_id: RecordId) -> LedgerEvent {
        LedgerEvent::CropRegistered {
            crop_id,
            owner: PartyId::new("farmer-1"),
            batch_number: "BATCH-ABCDEFGH-20250115".to_string(),
            fingerprint: "00".repeat(32),
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        let event = registered(RecordId::generate());
        assert_eq!(event.topic(), EventTopic::Crops);

        let tamper = LedgerEvent::TamperDetected {
            record_id: RecordId::generate(),
            kind: RecordKind::Crop,
            stored: String::new(),
            recomputed: String::new(),
        };
        assert_eq!(tamper.topic(), EventTopic::Audit);
        assert_eq!(tamper.crop_id(), None);
    }

    #[test]
    fn test_filter_all() {
        let filter = EventFilter::all();
        assert!(filter.matches(&registered(RecordId::generate())));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Shipments]);
        assert!(!filter.matches(&registered(RecordId::generate())));

        let filter = EventFilter::topics(vec![EventTopic::All]);
        assert!(filter.matches(&registered(RecordId::generate())));
    }

    #[test]
    fn test_filter_by_crop() {
        let watched = RecordId::generate();
        let filter = EventFilter::for_crops(vec![watched]);

        assert!(filter.matches(&registered(watched)));
        assert!(!filter.matches(&registered(RecordId::generate())));
        assert!(!filter.matches(&LedgerEvent::ComplaintResolved {
            complaint_id: RecordId::generate(),
        }));
    }
}
