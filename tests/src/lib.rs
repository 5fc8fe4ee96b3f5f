//! # Crop-Chain Test Suite
//!
//! Unified test crate for behavior that spans crates: the ledger services,
//! the change feed and the persisted record format.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── fingerprint.rs   # Hashing and verification throughput
//! └── src/integration/
//!     ├── flows.rs         # Full custody chains through the public API
//!     └── change_feed.rs   # Event ordering and filtering
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ledger-tests
//! cargo bench -p ledger-tests
//! ```

pub mod integration;
