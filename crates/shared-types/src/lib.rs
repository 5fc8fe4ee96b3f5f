//! # Shared Types Crate
//!
//! Identities and identifiers used by every crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Trusted Identity**: `CallerIdentity` is produced by the external identity
//!   provider and taken as-is. No credential checks happen in the ledger.
//! - **Opaque Ids**: `RecordId` and `PartyId` are compared by equality only.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
