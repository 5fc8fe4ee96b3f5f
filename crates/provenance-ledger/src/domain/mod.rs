//! Domain module for the provenance ledger
//!
//! Records, value objects, the hash engine, transition rules and errors.
//! Nothing here performs I/O.

pub mod errors;
pub mod fingerprint;
pub mod records;
pub mod reports;
pub mod transitions;
pub mod value_objects;

pub use errors::*;
pub use fingerprint::*;
pub use records::*;
pub use reports::*;
pub use transitions::*;
pub use value_objects::*;
