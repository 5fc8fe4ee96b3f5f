//! # Change Feed
//!
//! Checks what observers see on the bus while the ledger is driven through
//! its services: events arrive after the write, in write order, and a crop
//! filter isolates one lot's history.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use provenance_ledger::{NewComplaint, SupplyChainApi, VerificationApi};
    use shared_bus::{EventFilter, EventPublisher, EventTopic, LedgerEvent};
    use shared_types::CallerIdentity;

    fn label(event: &LedgerEvent) -> String {
        match event {
            LedgerEvent::CropRegistered { .. } => "registered".into(),
            LedgerEvent::CropStatusChanged { to, .. } => format!("crop:{to}"),
            LedgerEvent::ShipmentRequested { .. } => "requested".into(),
            LedgerEvent::ShipmentTransitioned { to, .. } => format!("shipment:{to}"),
            other => format!("{:?}", other.topic()),
        }
    }

    #[tokio::test]
    async fn test_crop_filter_follows_one_lot() {
        let chain = chain(21);
        let mut feed = chain.bus.subscribe(EventFilter::all());
        let crop = register(&chain).await;
        let mut watch = chain.bus.subscribe(EventFilter::for_crops(vec![crop.id]));
        let other = register(&chain).await;

        deliver(&chain, &other, &distributor()).await;
        deliver(&chain, &crop, &retailer()).await;
        chain
            .ledger
            .verification()
            .verify(crop.batch_number.as_str())
            .await
            .unwrap();

        let seen: Vec<_> = watch.drain().iter().map(label).collect();
        assert_eq!(
            seen,
            vec![
                "requested",
                "shipment:in_transit",
                "shipment:delivered",
                "crop:delivered",
                "crop:verified",
            ]
        );

        // The unfiltered subscriber saw both lots.
        let registered = feed
            .drain()
            .into_iter()
            .filter(|e| matches!(e, LedgerEvent::CropRegistered { .. }))
            .count();
        assert_eq!(registered, 2);
    }

    #[tokio::test]
    async fn test_failed_write_publishes_nothing() {
        let chain = chain(22);
        let before = chain.bus.events_published();

        let result = chain
            .ledger
            .ledger()
            .file_complaint(
                &CallerIdentity::customer("shopper-9"),
                NewComplaint {
                    title: "   ".into(),
                    description: "Sacks were short".into(),
                },
            )
            .await;

        assert!(result.is_err());
        assert_eq!(chain.bus.events_published(), before);
    }

    #[tokio::test]
    async fn test_complaints_topic() {
        let chain = chain(23);
        let mut complaints = chain
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Complaints]));
        register(&chain).await;

        let filed = chain
            .ledger
            .ledger()
            .file_complaint(
                &retailer(),
                NewComplaint {
                    title: "Late delivery".into(),
                    description: "Arrived two days after the agreed date".into(),
                },
            )
            .await
            .unwrap();
        chain
            .ledger
            .ledger()
            .resolve_complaint(&CallerIdentity::admin("ops-admin"), filed.id)
            .await
            .unwrap();

        let events = complaints.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LedgerEvent::ComplaintFiled { .. }));
        assert_eq!(events[1], LedgerEvent::ComplaintResolved { complaint_id: filed.id });
    }
}
