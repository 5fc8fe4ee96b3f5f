//! Ports module for the provenance ledger
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::{LedgerStoreApi, SupplyChainApi, TransitionApi, VerificationApi};
pub use outbound::{Clock, EntropySource, RecordFilter, RecordStore, RecordUpdate, StoreError, WriteOp};
