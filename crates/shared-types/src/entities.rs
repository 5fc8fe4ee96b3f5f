//! # Identity and Record Entities
//!
//! ## Clusters
//!
//! - **Parties**: `PartyId`, `Role`, `CallerIdentity`
//! - **Records**: `RecordId`, `RecordKind`

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: PARTIES
// =============================================================================

/// Opaque identifier of a supply-chain participant, as issued by the
/// identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartyId(pub String);

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An id made only of whitespace is treated as absent.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role a party plays in the supply chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Farmer,
    Distributor,
    Retailer,
    Admin,
    Customer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Farmer,
        Role::Distributor,
        Role::Retailer,
        Role::Admin,
        Role::Customer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Distributor => "distributor",
            Role::Retailer => "retailer",
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseError::UnknownRole(s.to_string()))
    }
}

/// The `{id, role}` pair the identity provider hands us for the current caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub id: PartyId,
    pub role: Role,
}

impl CallerIdentity {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: PartyId::new(id),
            role,
        }
    }

    pub fn farmer(id: impl Into<String>) -> Self {
        Self::new(id, Role::Farmer)
    }

    pub fn distributor(id: impl Into<String>) -> Self {
        Self::new(id, Role::Distributor)
    }

    pub fn retailer(id: impl Into<String>) -> Self {
        Self::new(id, Role::Retailer)
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self::new(id, Role::Customer)
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, Role::Admin)
    }
}

// =============================================================================
// CLUSTER B: RECORDS
// =============================================================================

/// Unique identifier of a ledger record (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(RecordId)
            .map_err(|_| ParseError::InvalidRecordId(s.to_string()))
    }
}

/// Kind of record held by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Crop,
    Shipment,
    Listing,
    Purchase,
    Complaint,
}

impl RecordKind {
    /// Domain-separation tag folded into every fingerprint.
    pub fn tag(self) -> &'static str {
        match self {
            RecordKind::Crop => "crop",
            RecordKind::Shipment => "shipment",
            RecordKind::Listing => "listing",
            RecordKind::Purchase => "purchase",
            RecordKind::Complaint => "complaint",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
