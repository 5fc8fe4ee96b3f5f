//! # Ledger Runtime Library
//!
//! Hosts a [`ProvenanceLedger`] over the in-memory store and forwards the
//! change feed to the log. The `main.rs` binary is a thin wrapper around
//! [`LedgerRuntime`]; the library form exists so the wiring can be tested.
//!
//! ## Startup Sequence
//!
//! 1. Load [`LedgerConfig`] from the environment
//! 2. Build the event bus with the configured capacity
//! 3. Wire store, clock and entropy into the ledger
//! 4. Spawn the change-feed logger
//! 5. Serve until shutdown

pub mod demo;

use anyhow::{Context, Result};
use provenance_ledger::{InMemoryRecordStore, LedgerConfig, ProvenanceLedger};
use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus, LedgerEvent, Subscription};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// The runtime owning the ledger and its change feed.
pub struct LedgerRuntime {
    ledger: ProvenanceLedger<InMemoryRecordStore>,
    bus: Arc<InMemoryEventBus>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LedgerRuntime {
    /// Validate `config` and wire the ledger around a fresh in-memory store.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        info!("Creating crop-chain ledger runtime");

        let bus = Arc::new(InMemoryEventBus::with_capacity(
            config.event_channel_capacity,
        ));
        let ledger = ProvenanceLedger::in_memory(config, bus.clone())
            .context("Invalid ledger configuration")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            ledger,
            bus,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Start the change-feed logger.
    ///
    /// The returned task resolves after [`shutdown`](Self::shutdown) with the
    /// number of events it logged. Events already queued when the signal
    /// arrives are still drained.
    pub fn start(&self) -> JoinHandle<u64> {
        info!("===========================================");
        info!("  Crop-Chain Ledger Runtime v0.1.0");
        info!("===========================================");

        let subscription = self.bus.subscribe(EventFilter::all());
        let shutdown = self.shutdown_rx.clone();
        tokio::spawn(run_change_feed(subscription, shutdown))
    }

    /// Signal the change feed to stop.
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
    }

    pub fn ledger(&self) -> &ProvenanceLedger<InMemoryRecordStore> {
        &self.ledger
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// Events published since startup.
    pub fn events_published(&self) -> u64 {
        self.bus.events_published()
    }
}

async fn run_change_feed(mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) -> u64 {
    let mut logged = 0;

    loop {
        tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => {
                    log_event(&event);
                    logged += 1;
                }
                None => break,
            },
            _ = shutdown.changed() => {
                for event in subscription.drain() {
                    log_event(&event);
                    logged += 1;
                }
                info!("[feed] Shutdown signal received");
                break;
            }
        }
    }

    logged
}

fn log_event(event: &LedgerEvent) {
    match event {
        LedgerEvent::TamperDetected {
            record_id,
            kind,
            stored,
            recomputed,
        } => warn!(
            record_id = %record_id,
            kind = %kind,
            stored = %stored,
            recomputed = %recomputed,
            "[feed] Tamper detected"
        ),
        other => info!(
            topic = ?other.topic(),
            record_id = %other.record_id(),
            "[feed] {:?}",
            other
        ),
    }
}
