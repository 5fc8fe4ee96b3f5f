//! # Provenance Ledger
//!
//! Append-only, content-fingerprinted ledger for crop supply chains. Farmers
//! register harvest lots, distributors carry them, retailers list and sell
//! them, and anyone can check a batch number or fingerprint against the stored
//! record.
//!
//! ## Architecture
//!
//! - **Domain**: Records, state machines, the hash engine, transition rules
//! - **Ports**: Inbound (`LedgerStoreApi`, `SupplyChainApi`, `TransitionApi`,
//!   `VerificationApi`) and Outbound (`RecordStore`, `Clock`, `EntropySource`)
//! - **Adapters**: In-memory store, system and fixed clocks, entropy sources
//! - **Application**: Service orchestration with store deadlines and atomic
//!   conditional writes
//!
//! ## Integrity model
//!
//! Each record carries `SHA-256(canonical payload, salt)` computed at creation.
//! The salt is stored alongside, so verification recomputes the fingerprint
//! from stored content and flags any mismatch as tampering. Status fields sit
//! outside the payload and change only through guarded transitions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{FixedClock, InMemoryRecordStore, OsEntropy, SeededEntropy, SystemClock};
pub use application::{
    LedgerContext, LedgerService, ProvenanceLedger, TransitionService, VerificationService,
};
pub use config::{ConfigError, LedgerConfig};
pub use domain::*;
pub use ports::inbound::{LedgerStoreApi, SupplyChainApi, TransitionApi, VerificationApi};
pub use ports::outbound::{
    Clock, EntropySource, RecordFilter, RecordStore, RecordUpdate, StoreError, WriteOp,
};
