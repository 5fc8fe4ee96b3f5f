//! Cross-crate integration tests.

pub mod change_feed;
pub mod flows;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, TimeZone, Utc};
    use provenance_ledger::{
        CropRecord, CropType, FixedClock, FixedPoint, InMemoryRecordStore, LedgerConfig, NewCrop,
        NewShipment, ProvenanceLedger, SeededEntropy, ShipmentRecord, ShipmentStatus,
        SupplyChainApi, TransitionApi,
    };
    use shared_bus::InMemoryEventBus;
    use shared_types::CallerIdentity;
    use std::sync::Arc;

    pub struct Chain {
        pub ledger: ProvenanceLedger<InMemoryRecordStore>,
        pub bus: Arc<InMemoryEventBus>,
        pub clock: Arc<FixedClock>,
    }

    pub fn chain(seed: u64) -> Chain {
        let bus = Arc::new(InMemoryEventBus::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 2, 7, 30, 0).unwrap(),
        ));
        let ledger = ProvenanceLedger::new(
            Arc::new(InMemoryRecordStore::new()),
            clock.clone(),
            Arc::new(SeededEntropy::new(seed)),
            bus.clone(),
            LedgerConfig::default(),
        )
        .unwrap();
        Chain { ledger, bus, clock }
    }

    pub fn farmer() -> CallerIdentity {
        CallerIdentity::farmer("farm-north")
    }

    pub fn distributor() -> CallerIdentity {
        CallerIdentity::distributor("haulage-east")
    }

    pub fn retailer() -> CallerIdentity {
        CallerIdentity::retailer("market-west")
    }

    pub fn maize() -> NewCrop {
        NewCrop {
            crop_name: "Maize".into(),
            crop_type: CropType::Grain,
            quantity: FixedPoint::from_units(1_200).unwrap(),
            price_per_unit: "0.8".parse().unwrap(),
            sowing_date: NaiveDate::from_ymd_opt(2024, 10, 20),
            harvest_date: NaiveDate::from_ymd_opt(2025, 2, 25),
        }
    }

    pub async fn register(chain: &Chain) -> CropRecord {
        chain
            .ledger
            .ledger()
            .register_crop(&farmer(), maize())
            .await
            .unwrap()
    }

    /// Ship `crop` from the farmer to `to` and deliver it.
    pub async fn deliver(chain: &Chain, crop: &CropRecord, to: &CallerIdentity) -> ShipmentRecord {
        let shipment = chain
            .ledger
            .ledger()
            .request_shipment(
                &farmer(),
                NewShipment {
                    crop_id: crop.id,
                    to_party: to.id.clone(),
                },
            )
            .await
            .unwrap();
        chain.clock.advance(chrono::Duration::hours(1));
        chain
            .ledger
            .transitions()
            .transition_shipment(&farmer(), shipment.id, ShipmentStatus::InTransit)
            .await
            .unwrap();
        chain.clock.advance(chrono::Duration::hours(5));
        chain
            .ledger
            .transitions()
            .transition_shipment(to, shipment.id, ShipmentStatus::Delivered)
            .await
            .unwrap()
    }
}
