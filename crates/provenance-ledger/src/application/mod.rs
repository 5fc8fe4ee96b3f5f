//! Application layer for the provenance ledger
//!
//! Services orchestrating domain rules against the outbound ports.

mod context;
pub mod ledger;
pub mod service;
pub mod transitions;
pub mod verification;


pub use context::LedgerContext;
pub use ledger::LedgerService;
pub use service::ProvenanceLedger;
pub use transitions::TransitionService;
pub use verification::VerificationService;
