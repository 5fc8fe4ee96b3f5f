//! Adapters for the provenance ledger
//!
//! Concrete implementations of the outbound ports.

mod clock;
mod entropy;
mod memory_store;

pub use clock::{FixedClock, SystemClock};
pub use entropy::{OsEntropy, SeededEntropy};
pub use memory_store::InMemoryRecordStore;
