//! # Hash Engine
//!
//! Content fingerprints for ledger records.
//!
//! A fingerprint is `SHA-256(canonical || "_" || salt timestamp || "_" || nonce)`
//! rendered as 64 lowercase hex characters. The canonical string is built from
//! an ordered list of named fields, never from a serializer's key order, so the
//! same logical record always produces the same bytes.
//!
//! The salt is persisted next to the fingerprint. Recomputing from the stored
//! fields and stored salt reproduces the fingerprint exactly, which is how
//! verification detects tampering.

use crate::domain::errors::LedgerError;
use crate::domain::value_objects::FixedPoint;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::{RecordId, RecordKind};
use std::fmt;

/// Hex characters in a rendered fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Characters kept on each side by `Fingerprint::short`.
const SHORT_EDGE: usize = 6;

/// 32-byte SHA-256 digest of a canonical payload plus salt.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the canonical lowercase rendering. Anything else is rejected.
    pub fn from_hex(s: &str) -> Result<Self, LedgerError> {
        if !is_well_formed(s) {
            return Err(LedgerError::validation(
                "fingerprint",
                "expected 64 lowercase hex characters",
            ));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| LedgerError::validation("fingerprint", e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Display form for receipts and labels: `abcdef...123456`.
    pub fn short(&self) -> String {
        let hex = self.to_hex();
        format!(
            "{}...{}",
            &hex[..SHORT_EDGE],
            &hex[FINGERPRINT_HEX_LEN - SHORT_EDGE..]
        )
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.to_hex()
    }
}

/// Structural check only: exactly 64 lowercase hex characters.
///
/// Says nothing about whether the fingerprint belongs to any record.
pub fn is_well_formed(claimed: &str) -> bool {
    claimed.len() == FINGERPRINT_HEX_LEN
        && claimed
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Per-record salt: creation timestamp plus a random base36 nonce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Salt {
    pub timestamp: DateTime<Utc>,
    pub nonce: String,
}

impl Salt {
    /// Timestamps are truncated to milliseconds so the stored value and the
    /// hashed rendering always agree.
    pub fn new(timestamp: DateTime<Utc>, nonce: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(3),
            nonce: nonce.into(),
        }
    }

    /// `YYYY-MM-DDTHH:MM:SS.mmmZ`
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }

    fn validate(&self) -> Result<(), LedgerError> {
        if self.nonce.is_empty() {
            return Err(LedgerError::validation("salt", "nonce must not be empty"));
        }
        if !self
            .nonce
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
        {
            return Err(LedgerError::validation("salt", "nonce must be base36"));
        }
        Ok(())
    }
}

/// Fingerprint plus the salt it was computed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seal {
    pub fingerprint: Fingerprint,
    pub salt: Salt,
}

impl Seal {
    /// Hash `payload` with `salt`.
    pub fn compute(payload: &CanonicalPayload, salt: Salt) -> Result<Self, LedgerError> {
        let fingerprint = compute_fingerprint(payload, &salt)?;
        Ok(Self { fingerprint, salt })
    }

    /// Recompute from `payload` with the stored salt.
    pub fn recompute(&self, payload: &CanonicalPayload) -> Result<Fingerprint, LedgerError> {
        compute_fingerprint(payload, &self.salt)
    }

    /// True when `payload` reproduces the stored fingerprint.
    pub fn matches(&self, payload: &CanonicalPayload) -> bool {
        self.recompute(payload)
            .map(|fp| fp == self.fingerprint)
            .unwrap_or(false)
    }
}

/// A single canonical field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Decimal(FixedPoint),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Id(RecordId),
    /// Optional field with no value. Renders as the empty string.
    Absent,
}

impl FieldValue {
    fn render(&self, out: &mut String) {
        match self {
            Self::Text(text) => escape_into(text, out),
            Self::Decimal(d) => out.push_str(&d.to_string()),
            Self::Date(d) => out.push_str(&d.format("%Y-%m-%d").to_string()),
            Self::Timestamp(t) => out.push_str(&t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
            Self::Id(id) => out.push_str(&id.to_string()),
            Self::Absent => {}
        }
    }

    fn is_missing(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<FixedPoint> for FieldValue {
    fn from(value: FixedPoint) -> Self {
        Self::Decimal(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<RecordId> for FieldValue {
    fn from(value: RecordId) -> Self {
        Self::Id(value)
    }
}

// Field separators must not be forgeable from inside a value.
fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        if matches!(ch, '\\' | '|' | '=') {
            out.push('\\');
        }
        out.push(ch);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CanonicalField {
    name: &'static str,
    value: FieldValue,
    required: bool,
}

/// Ordered, named fields of a record, tagged with the record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPayload {
    kind: RecordKind,
    fields: Vec<CanonicalField>,
}

impl CanonicalPayload {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
        }
    }

    /// Field that must be present and non-blank.
    #[must_use]
    pub fn required(mut self, name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.fields.push(CanonicalField {
            name,
            value: value.into(),
            required: true,
        });
        self
    }

    /// Field that renders as empty when `None`.
    #[must_use]
    pub fn optional<V: Into<FieldValue>>(mut self, name: &'static str, value: Option<V>) -> Self {
        self.fields.push(CanonicalField {
            name,
            value: value.map_or(FieldValue::Absent, Into::into),
            required: false,
        });
        self
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Reject payloads with a missing required field.
    pub fn validate(&self) -> Result<(), LedgerError> {
        match self.fields.iter().find(|f| f.required && f.value.is_missing()) {
            Some(field) => Err(LedgerError::validation(field.name, "required field is missing")),
            None => Ok(()),
        }
    }

    /// `kind=<tag>|name=value|...` with separators escaped inside values.
    pub fn canonical_string(&self) -> String {
        let mut out = String::with_capacity(32 + self.fields.len() * 24);
        out.push_str("kind=");
        out.push_str(self.kind.tag());
        for field in &self.fields {
            out.push('|');
            out.push_str(field.name);
            out.push('=');
            field.value.render(&mut out);
        }
        out
    }
}

/// Compute the fingerprint of `payload` under `salt`.
///
/// Deterministic for a given `(payload, salt)`. Fails with `Validation` before
/// hashing anything when a required field is missing.
pub fn compute_fingerprint(payload: &CanonicalPayload, salt: &Salt) -> Result<Fingerprint, LedgerError> {
    payload.validate()?;
    salt.validate()?;

    let mut hasher = Sha256::new();
    hasher.update(payload.canonical_string().as_bytes());
    hasher.update(b"_");
    hasher.update(salt.timestamp_iso().as_bytes());
    hasher.update(b"_");
    hasher.update(salt.nonce.as_bytes());
    Ok(Fingerprint(hasher.finalize().into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn salt() -> Salt {
        Salt::new(
            Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap(),
            "k3x9q2za7b",
        )
    }

    fn rice(name: &str) -> CanonicalPayload {
        CanonicalPayload::new(RecordKind::Crop)
            .required("owner", "farmer-1")
            .required("crop_name", name)
            .required("quantity", FixedPoint::from_milli(500_000))
            .optional("harvest_date", NaiveDate::from_ymd_opt(2025, 1, 10))
            .optional::<NaiveDate>("sowing_date", None)
    }

    #[test]
    fn test_canonical_string_layout() {
        let s = rice("Rice").canonical_string();
        assert_eq!(
            s,
            "kind=crop|owner=farmer-1|crop_name=Rice|quantity=500.000|harvest_date=2025-01-10|sowing_date="
        );
    }

    #[test]
    fn test_fingerprint_is_lowercase_hex() {
        let fp = compute_fingerprint(&rice("Rice"), &salt()).unwrap();
        let hex = fp.to_hex();
        assert_eq!(hex.len(), FINGERPRINT_HEX_LEN);
        assert!(is_well_formed(&hex));
        assert_eq!(Fingerprint::from_hex(&hex).unwrap(), fp);
    }

    #[test]
    fn test_missing_required_field_fails_before_hashing() {
        let err = compute_fingerprint(&rice("  "), &salt()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::validation("crop_name", "required field is missing")
        );
    }

    #[test]
    fn test_empty_nonce_rejected() {
        let salt = Salt::new(Utc::now(), "");
        assert!(compute_fingerprint(&rice("Rice"), &salt).is_err());
    }

    #[test]
    fn test_escaping_prevents_field_forgery() {
        let a = CanonicalPayload::new(RecordKind::Complaint)
            .required("title", "a|description=b")
            .optional::<&str>("description", None);
        let b = CanonicalPayload::new(RecordKind::Complaint)
            .required("title", "a")
            .optional("description", Some("b"));
        assert_ne!(a.canonical_string(), b.canonical_string());
    }

    #[test]
    fn test_kind_separates_domains() {
        let crop = CanonicalPayload::new(RecordKind::Crop).required("x", "1");
        let shipment = CanonicalPayload::new(RecordKind::Shipment).required("x", "1");
        assert_ne!(
            compute_fingerprint(&crop, &salt()).unwrap(),
            compute_fingerprint(&shipment, &salt()).unwrap()
        );
    }

    #[test]
    fn test_salt_truncates_to_millis() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let salt = Salt::new(ts, "abc");
        assert_eq!(salt.timestamp_iso(), "2025-01-15T08:30:00.123Z");
        assert_eq!(salt.timestamp.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_short_form() {
        let fp = Fingerprint::from_bytes([0xab; 32]);
        assert_eq!(fp.short(), "ababab...ababab");
    }

    #[test]
    fn test_well_formed() {
        assert!(is_well_formed(&"0".repeat(64)));
        assert!(!is_well_formed(&"A".repeat(64)));
        assert!(!is_well_formed(&"0".repeat(63)));
        assert!(!is_well_formed(&"g".repeat(64)));
    }

    #[test]
    fn test_seal_matches_and_detects_change() {
        let seal = Seal::compute(&rice("Rice"), salt()).unwrap();
        assert!(seal.matches(&rice("Rice")));
        assert!(!seal.matches(&rice("Ricf")));
    }

    proptest! {
        #[test]
        fn prop_same_input_same_fingerprint(name in "[a-zA-Z ]{1,24}", nonce in "[a-z0-9]{1,13}") {
            prop_assume!(!name.trim().is_empty());
            let salt = Salt::new(Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap(), nonce);
            let a = compute_fingerprint(&rice(&name), &salt).unwrap();
            let b = compute_fingerprint(&rice(&name), &salt).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_single_char_change_changes_fingerprint(
            name in "[a-z]{2,24}",
            idx in 0usize..24,
        ) {
            let idx = idx % name.len();
            let mut changed: Vec<char> = name.chars().collect();
            changed[idx] = if changed[idx] == 'z' { 'y' } else { 'z' };
            let changed: String = changed.into_iter().collect();
            prop_assume!(changed != name);

            let a = compute_fingerprint(&rice(&name), &salt()).unwrap();
            let b = compute_fingerprint(&rice(&changed), &salt()).unwrap();
            prop_assert_ne!(a, b);
        }
    }
}
