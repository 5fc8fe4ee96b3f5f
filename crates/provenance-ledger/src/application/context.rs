//! Shared plumbing for the ledger services

use crate::config::LedgerConfig;
use crate::domain::{
    ComplaintRecord, CropRecord, InventoryListing, LedgerError, LedgerRecord, Salt, ShipmentRecord,
    TransitionRejection,
};
use crate::ports::outbound::{Clock, EntropySource, RecordFilter, RecordStore, StoreError, WriteOp};
use shared_bus::{EventPublisher, LedgerEvent};
use shared_types::{RecordId, RecordKind};
use std::future::Future;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Dependencies every ledger service shares.
pub struct LedgerContext<S> {
    pub(crate) store: Arc<S>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) entropy: Arc<dyn EntropySource>,
    pub(crate) events: Arc<dyn EventPublisher>,
    pub(crate) config: LedgerConfig,
}

impl<S> Clone for LedgerContext<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            entropy: Arc::clone(&self.entropy),
            events: Arc::clone(&self.events),
            config: self.config.clone(),
        }
    }
}

impl<S: RecordStore + 'static> LedgerContext<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
        events: Arc<dyn EventPublisher>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            clock,
            entropy,
            events,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fresh salt: current time plus a random nonce.
    pub(crate) fn salt(&self) -> Salt {
        Salt::new(
            self.clock.now(),
            self.entropy.base36(self.config.salt_nonce_len),
        )
    }

    /// Run a read against the store under the configured deadline.
    pub(crate) async fn read<T, F>(&self, operation: &'static str, call: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match timeout(self.config.store_timeout(), call).await {
            Ok(result) => result.map_err(|e| store_error(operation, e)),
            Err(_) => Err(self.timed_out(operation)),
        }
    }

    /// Submit an atomic batch.
    ///
    /// The commit runs on its own task, so once submitted it completes even if
    /// the caller stops waiting. A deadline miss is reported as `Unavailable`;
    /// the batch may still land afterwards.
    pub(crate) async fn submit(
        &self,
        operation: &'static str,
        ops: Vec<WriteOp>,
    ) -> Result<(), StoreError> {
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move { store.commit(ops).await });

        match timeout(self.config.store_timeout(), handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(StoreError::Unavailable(format!(
                "{operation} aborted: {join_error}"
            ))),
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.config.store_timeout_ms,
                    "Store commit exceeded deadline, outcome unknown"
                );
                Err(StoreError::Unavailable(format!(
                    "{operation} timed out after {}ms",
                    self.config.store_timeout_ms
                )))
            }
        }
    }

    fn timed_out(&self, operation: &'static str) -> LedgerError {
        warn!(
            operation,
            timeout_ms = self.config.store_timeout_ms,
            "Store call exceeded deadline"
        );
        LedgerError::StoreUnavailable {
            operation,
            reason: format!("timed out after {}ms", self.config.store_timeout_ms),
        }
    }

    pub(crate) async fn get(&self, id: RecordId) -> Result<Option<LedgerRecord>, LedgerError> {
        self.read("get", self.store.get(id)).await
    }

    pub(crate) async fn find(&self, filter: &RecordFilter) -> Result<Vec<LedgerRecord>, LedgerError> {
        self.read("find", self.store.find(filter)).await
    }

    async fn get_kind(&self, id: RecordId, kind: RecordKind) -> Result<LedgerRecord, LedgerError> {
        match self.get(id).await? {
            Some(record) if record.kind() == kind => Ok(record),
            _ => Err(LedgerError::not_found(kind.tag(), id)),
        }
    }

    pub(crate) async fn get_crop(&self, id: RecordId) -> Result<CropRecord, LedgerError> {
        match self.get_kind(id, RecordKind::Crop).await? {
            LedgerRecord::Crop(crop) => Ok(crop),
            _ => Err(LedgerError::not_found("crop", id)),
        }
    }

    pub(crate) async fn get_shipment(&self, id: RecordId) -> Result<ShipmentRecord, LedgerError> {
        match self.get_kind(id, RecordKind::Shipment).await? {
            LedgerRecord::Shipment(shipment) => Ok(shipment),
            _ => Err(LedgerError::not_found("shipment", id)),
        }
    }

    pub(crate) async fn get_listing(&self, id: RecordId) -> Result<InventoryListing, LedgerError> {
        match self.get_kind(id, RecordKind::Listing).await? {
            LedgerRecord::Listing(listing) => Ok(listing),
            _ => Err(LedgerError::not_found("listing", id)),
        }
    }

    pub(crate) async fn get_complaint(&self, id: RecordId) -> Result<ComplaintRecord, LedgerError> {
        match self.get_kind(id, RecordKind::Complaint).await? {
            LedgerRecord::Complaint(complaint) => Ok(complaint),
            _ => Err(LedgerError::not_found("complaint", id)),
        }
    }

    /// Notify the change feed. Never fails the caller.
    pub(crate) async fn publish(&self, event: LedgerEvent) {
        let receivers = self.events.publish(event).await;
        debug!(receivers, "Ledger event published");
    }
}

/// Default translation of adapter errors.
pub(crate) fn store_error(operation: &'static str, err: StoreError) -> LedgerError {
    match err {
        StoreError::Unavailable(reason) => LedgerError::StoreUnavailable { operation, reason },
        StoreError::UniqueViolation(key) => LedgerError::DuplicateKey {
            field: key.field(),
            value: key.value(),
        },
        StoreError::Missing(id) => LedgerError::not_found("record", id),
        StoreError::PreconditionFailed {
            id,
            expected,
            actual,
        } => LedgerError::IllegalTransition {
            record_id: id,
            from: expected,
            to: operation.to_string(),
            reason: TransitionRejection::StaleState { observed: actual },
        },
    }
}
