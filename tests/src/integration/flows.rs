//! # Integration Test Flows
//!
//! Full custody chains driven only through the inbound port traits, the way a
//! host application would use the ledger.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use provenance_ledger::{
        ErrorKind, FixedPoint, LedgerRecord, LedgerStoreApi, NewListing, NewPurchase,
        NewShipment, ShipmentStatus, SupplyChainApi, TransitionApi, VerificationApi,
    };
    use shared_bus::{EventFilter, EventTopic, LedgerEvent};
    use shared_types::CallerIdentity;

    // =============================================================================
    // CUSTODY CHAIN
    // =============================================================================

    #[tokio::test]
    async fn test_rejected_shipment_then_retail_sale() {
        let chain = chain(7);
        let crop = register(&chain).await;

        // The distributor turns the first request down.
        let refused = chain
            .ledger
            .ledger()
            .request_shipment(
                &farmer(),
                NewShipment {
                    crop_id: crop.id,
                    to_party: distributor().id,
                },
            )
            .await
            .unwrap();
        chain
            .ledger
            .transitions()
            .transition_shipment(&distributor(), refused.id, ShipmentStatus::Rejected)
            .await
            .unwrap();

        chain.clock.advance(chrono::Duration::hours(2));
        let shipment = deliver(&chain, &crop, &retailer()).await;
        assert!(shipment.delivery_date.is_some());

        let listing = chain
            .ledger
            .ledger()
            .create_listing(
                &retailer(),
                NewListing {
                    shipment_id: shipment.id,
                    allocated_quantity: FixedPoint::from_units(1_000).unwrap(),
                    unit_price: None,
                },
            )
            .await
            .unwrap();
        // 0.8 with a 30% markup.
        assert_eq!(listing.unit_price.to_string(), "1.040");

        let mut purchases = Vec::new();
        for (customer, qty) in [("shopper-1", 40), ("shopper-2", 60)] {
            chain.clock.advance(chrono::Duration::minutes(15));
            let purchase = chain
                .ledger
                .ledger()
                .record_purchase(
                    &CallerIdentity::customer(customer),
                    NewPurchase {
                        listing_id: listing.id,
                        quantity: FixedPoint::from_units(qty).unwrap(),
                    },
                )
                .await
                .unwrap();
            purchases.push(purchase);
        }

        let trace = chain.ledger.ledger().trace_crop(crop.id).await.unwrap();
        assert_eq!(trace.shipments.len(), 2);
        assert_eq!(trace.shipments[0].status, ShipmentStatus::Rejected);
        assert_eq!(trace.shipments[1].status, ShipmentStatus::Delivered);
        assert_eq!(trace.current_holder(), &retailer().id);
        assert_eq!(trace.total_sold(), FixedPoint::from_units(100));
        assert_eq!(
            trace.listings[0].stock_quantity,
            FixedPoint::from_units(900).unwrap()
        );
        let purchase_ids: Vec<_> = trace.purchases.iter().map(|p| p.id).collect();
        assert_eq!(purchase_ids, purchases.iter().map(|p| p.id).collect::<Vec<_>>());

        // Every record in the chain verifies by its own fingerprint.
        let verification = chain.ledger.verification();
        for fingerprint in [
            refused.seal.fingerprint,
            shipment.seal.fingerprint,
            listing.seal.fingerprint,
            purchases[0].seal.fingerprint,
            purchases[1].seal.fingerprint,
        ] {
            let report = verification.verify(&fingerprint.to_hex()).await.unwrap();
            assert!(report.authentic, "{}", fingerprint.short());
            assert!(!report.newly_verified);
        }

        let report = verification.verify(crop.batch_number.as_str()).await.unwrap();
        assert!(report.newly_verified);
    }

    #[tokio::test]
    async fn test_customer_history_lists_only_their_purchases() {
        let chain = chain(11);
        let crop = register(&chain).await;
        let shipment = deliver(&chain, &crop, &retailer()).await;
        let listing = chain
            .ledger
            .ledger()
            .create_listing(
                &retailer(),
                NewListing {
                    shipment_id: shipment.id,
                    allocated_quantity: FixedPoint::from_units(10).unwrap(),
                    unit_price: Some("2".parse().unwrap()),
                },
            )
            .await
            .unwrap();

        for name in ["alice", "bob", "alice"] {
            chain.clock.advance(chrono::Duration::minutes(1));
            chain
                .ledger
                .ledger()
                .record_purchase(
                    &CallerIdentity::customer(name),
                    NewPurchase {
                        listing_id: listing.id,
                        quantity: FixedPoint::from_units(1).unwrap(),
                    },
                )
                .await
                .unwrap();
        }

        let history = chain
            .ledger
            .ledger()
            .list_by_party(&CallerIdentity::customer("alice").id, None)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert!(history
            .iter()
            .all(|r| matches!(r, LedgerRecord::Purchase(_))));
        assert!(history[0].created_at() > history[1].created_at());
    }

    #[tokio::test]
    async fn test_distributor_cannot_list_or_register() {
        let chain = chain(3);
        let crop = register(&chain).await;
        let shipment = deliver(&chain, &crop, &distributor()).await;

        let err = chain
            .ledger
            .ledger()
            .create_listing(
                &distributor(),
                NewListing {
                    shipment_id: shipment.id,
                    allocated_quantity: FixedPoint::from_units(5).unwrap(),
                    unit_price: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = chain
            .ledger
            .ledger()
            .register_crop(&distributor(), maize())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    // =============================================================================
    // PERSISTED FORMAT
    // =============================================================================

    #[tokio::test]
    async fn test_json_round_trip_still_verifies() {
        let chain = chain(5);
        let crop = register(&chain).await;
        let shipment = deliver(&chain, &crop, &distributor()).await;

        for record in [LedgerRecord::Crop(crop), LedgerRecord::Shipment(shipment)] {
            let json = serde_json::to_string(&record).unwrap();
            let restored: LedgerRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(restored, record);
            assert!(restored.seal().matches(&restored.canonical_payload()));
        }
    }

    #[tokio::test]
    async fn test_legacy_stored_status_reads_as_rejected() {
        let chain = chain(9);
        let crop = register(&chain).await;
        let shipment = chain
            .ledger
            .ledger()
            .request_shipment(
                &farmer(),
                NewShipment {
                    crop_id: crop.id,
                    to_party: distributor().id,
                },
            )
            .await
            .unwrap();

        let json = serde_json::to_string(&LedgerRecord::Shipment(shipment))
            .unwrap()
            .replace("\"status\":\"pending\"", "\"status\":\"stored\"");
        let legacy: LedgerRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(
            legacy.as_shipment().unwrap().status,
            ShipmentStatus::Rejected
        );
        // Status sits outside the fingerprint.
        assert!(legacy.seal().matches(&legacy.canonical_payload()));
    }

    // =============================================================================
    // TAMPERING
    // =============================================================================

    #[tokio::test]
    async fn test_rerouted_shipment_is_detected() {
        let chain = chain(13);
        let crop = register(&chain).await;
        let shipment = deliver(&chain, &crop, &distributor()).await;
        let mut audit = chain
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Audit]));

        assert!(chain.ledger.store().tamper(shipment.id, |record| {
            if let LedgerRecord::Shipment(s) = record {
                s.to_party = retailer().id;
            }
        }));

        let err = chain
            .ledger
            .verification()
            .ensure_authentic(&shipment.seal.fingerprint.to_hex())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TamperDetected);

        match audit.try_recv().unwrap() {
            Some(LedgerEvent::TamperDetected { record_id, stored, .. }) => {
                assert_eq!(record_id, shipment.id);
                assert_eq!(stored, shipment.seal.fingerprint.to_hex());
            }
            other => panic!("expected tamper event, got {other:?}"),
        }

        // The crop itself is untouched and still verifies.
        let report = chain
            .ledger
            .verification()
            .verify(crop.batch_number.as_str())
            .await
            .unwrap();
        assert!(report.authentic);
    }
}
