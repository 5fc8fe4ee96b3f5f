//! Provenance Ledger
//!
//! Wires the ledger, transition and verification services around one shared
//! context. Hosts hold a `ProvenanceLedger` and call through the inbound port
//! traits.

use crate::adapters::{InMemoryRecordStore, OsEntropy, SystemClock};
use crate::application::context::LedgerContext;
use crate::application::ledger::LedgerService;
use crate::application::transitions::TransitionService;
use crate::application::verification::VerificationService;
use crate::config::{ConfigError, LedgerConfig};
use crate::ports::outbound::{Clock, EntropySource, RecordStore};
use shared_bus::EventPublisher;
use std::sync::Arc;
use tracing::info;

pub struct ProvenanceLedger<S> {
    ctx: LedgerContext<S>,
    ledger: LedgerService<S>,
    transitions: TransitionService<S>,
    verification: VerificationService<S>,
}

impl<S> Clone for ProvenanceLedger<S> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            ledger: self.ledger.clone(),
            transitions: self.transitions.clone(),
            verification: self.verification.clone(),
        }
    }
}

impl<S: RecordStore + 'static> ProvenanceLedger<S> {
    /// Validates `config` before wiring anything.
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
        events: Arc<dyn EventPublisher>,
        config: LedgerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let ctx = LedgerContext::new(store, clock, entropy, events, config);

        info!(
            store_timeout_ms = ctx.config().store_timeout_ms,
            batch_number_retries = ctx.config().batch_number_retries,
            listing_markup_percent = ctx.config().listing_markup_percent,
            "Provenance ledger initialized"
        );

        Ok(Self {
            ledger: LedgerService::new(ctx.clone()),
            transitions: TransitionService::new(ctx.clone()),
            verification: VerificationService::new(ctx.clone()),
            ctx,
        })
    }

    /// Store, lookups and role-gated writes.
    pub fn ledger(&self) -> &LedgerService<S> {
        &self.ledger
    }

    pub fn transitions(&self) -> &TransitionService<S> {
        &self.transitions
    }

    pub fn verification(&self) -> &VerificationService<S> {
        &self.verification
    }

    pub fn store(&self) -> &Arc<S> {
        self.ctx.store()
    }

    pub fn config(&self) -> &LedgerConfig {
        self.ctx.config()
    }
}

impl ProvenanceLedger<InMemoryRecordStore> {
    /// In-memory store, system clock and OS entropy.
    pub fn in_memory(
        config: LedgerConfig,
        events: Arc<dyn EventPublisher>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(SystemClock),
            Arc::new(OsEntropy),
            events,
            config,
        )
    }
}
