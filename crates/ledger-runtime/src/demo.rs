//! Scripted walk through one harvest lot: registration, delivery to a
//! retailer, a listing, a sale and a public verification.

use anyhow::{ensure, Context, Result};
use chrono::{Days, Utc};
use provenance_ledger::{
    CropType, FixedPoint, LedgerStoreApi, NewCrop, NewListing, NewPurchase, NewShipment,
    ProvenanceLedger, RecordStore, ShipmentStatus, SupplyChainApi, TransitionApi,
    VerificationApi,
};
use shared_types::{CallerIdentity, RecordId};
use tracing::info;

/// What the demo left behind in the ledger.
#[derive(Debug, Clone)]
pub struct DemoSummary {
    pub crop_id: RecordId,
    pub batch_number: String,
    pub receipt: String,
    pub remaining_stock: FixedPoint,
}

pub async fn run_demo<S: RecordStore + 'static>(
    ledger: &ProvenanceLedger<S>,
) -> Result<DemoSummary> {
    let farmer = CallerIdentity::farmer("demo-farmer");
    let retailer = CallerIdentity::retailer("demo-retailer");
    let customer = CallerIdentity::customer("demo-customer");

    let harvested = Utc::now().date_naive();
    let crop = ledger
        .ledger()
        .register_crop(
            &farmer,
            NewCrop {
                crop_name: "Rice".into(),
                crop_type: CropType::Grain,
                quantity: FixedPoint::from_units(500).context("quantity overflow")?,
                price_per_unit: "2.5".parse()?,
                sowing_date: harvested.checked_sub_days(Days::new(130)),
                harvest_date: Some(harvested),
            },
        )
        .await?;

    let shipment = ledger
        .ledger()
        .request_shipment(
            &farmer,
            NewShipment {
                crop_id: crop.id,
                to_party: retailer.id.clone(),
            },
        )
        .await?;
    ledger
        .transitions()
        .transition_shipment(&farmer, shipment.id, ShipmentStatus::InTransit)
        .await?;
    ledger
        .transitions()
        .transition_shipment(&retailer, shipment.id, ShipmentStatus::Delivered)
        .await?;

    let listing = ledger
        .ledger()
        .create_listing(
            &retailer,
            NewListing {
                shipment_id: shipment.id,
                allocated_quantity: FixedPoint::from_units(200).context("quantity overflow")?,
                unit_price: None,
            },
        )
        .await?;
    ledger
        .ledger()
        .record_purchase(
            &customer,
            NewPurchase {
                listing_id: listing.id,
                quantity: FixedPoint::from_units(20).context("quantity overflow")?,
            },
        )
        .await?;

    let report = ledger
        .verification()
        .verify(crop.batch_number.as_str())
        .await?;
    ensure!(report.authentic, "freshly registered crop failed verification");
    let receipt = report.receipt().context("authentic report without receipt")?;

    let trace = ledger.ledger().trace_crop(crop.id).await?;
    let remaining_stock = trace
        .listings
        .first()
        .map(|l| l.stock_quantity)
        .unwrap_or_default();

    let sold = trace.total_sold().context("sold quantity overflow")?;

    info!(
        batch_number = %crop.batch_number,
        receipt = %receipt,
        holder = %trace.current_holder(),
        sold = %sold,
        remaining = %remaining_stock,
        "[demo] Harvest lot traced"
    );

    Ok(DemoSummary {
        crop_id: crop.id,
        batch_number: crop.batch_number.to_string(),
        receipt,
        remaining_stock,
    })
}
