//! # Crop-Chain Ledger Runtime
//!
//! Entry point for the provenance ledger service.
//!
//! Configuration comes from `LEDGER_*` environment variables (see
//! `LedgerConfig::from_env`); log verbosity from `RUST_LOG`. Set
//! `LEDGER_DEMO=1` to seed the ledger with one traced harvest lot at startup.

use anyhow::Result;
use ledger_runtime::{demo, LedgerRuntime};
use provenance_ledger::LedgerConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = LedgerConfig::from_env();
    let runtime = LedgerRuntime::new(config)?;
    let feed = runtime.start();

    if std::env::var("LEDGER_DEMO").is_ok_and(|v| v == "1") {
        match demo::run_demo(runtime.ledger()).await {
            Ok(summary) => info!(
                batch_number = %summary.batch_number,
                receipt = %summary.receipt,
                "Demo lot registered"
            ),
            Err(e) => warn!("Demo flow failed: {:#}", e),
        }
    }

    info!("Ledger is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown();
    let logged = feed.await?;
    info!(events = logged, "Shutdown complete");

    Ok(())
}
