//! Value objects for the provenance ledger
//!
//! - `FixedPoint`: quantities and prices with three decimal places
//! - `BatchNumber`: human-facing lookup key of a harvest lot

use crate::domain::errors::LedgerError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Thousandths per unit.
pub const FIXED_POINT_SCALE: u64 = 1_000;

/// Non-negative decimal with exactly three fractional digits.
///
/// Stored as thousandths so canonical rendering never depends on float
/// formatting: `2.5` always renders as `"2.500"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FixedPoint(u64);

impl FixedPoint {
    pub const ZERO: FixedPoint = FixedPoint(0);

    pub const fn from_milli(milli: u64) -> Self {
        Self(milli)
    }

    pub fn from_units(units: u64) -> Option<Self> {
        units.checked_mul(FIXED_POINT_SCALE).map(Self)
    }

    pub const fn milli(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// `self * (100 + percent) / 100`, rounded half up to the nearest thousandth.
    pub fn with_markup(self, percent: u32) -> Option<Self> {
        let scaled = self.0.checked_mul(100 + u64::from(percent))?;
        Some(Self(scaled.checked_add(50)? / 100))
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:03}",
            self.0 / FIXED_POINT_SCALE,
            self.0 % FIXED_POINT_SCALE
        )
    }
}

impl FromStr for FixedPoint {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| LedgerError::validation("decimal", format!("{reason}: {s:?}"));

        let s = s.trim();
        if s.is_empty() {
            return Err(malformed("empty"));
        }
        if s.starts_with('-') {
            return Err(malformed("negative"));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("not a decimal"));
        }
        if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("more than three fractional digits"));
        }

        let whole: u64 = whole.parse().map_err(|_| malformed("out of range"))?;
        let mut milli: u64 = 0;
        for (i, digit) in frac.bytes().enumerate() {
            milli += u64::from(digit - b'0') * 10u64.pow(2 - i as u32);
        }

        whole
            .checked_mul(FIXED_POINT_SCALE)
            .and_then(|w| w.checked_add(milli))
            .map(Self)
            .ok_or_else(|| malformed("out of range"))
    }
}

impl TryFrom<String> for FixedPoint {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FixedPoint> for String {
    fn from(value: FixedPoint) -> Self {
        value.to_string()
    }
}

/// Length of the random part of a batch number.
pub const BATCH_TOKEN_LEN: usize = 8;

const BATCH_PREFIX: &str = "BATCH-";

/// `BATCH-<8 uppercase alphanumerics>-<YYYYMMDD>`
///
/// The date is the day the number was generated, not the harvest date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchNumber(String);

impl BatchNumber {
    /// Build a batch number from a random token and the generation date.
    ///
    /// The token is uppercased; it must be `BATCH_TOKEN_LEN` ASCII alphanumerics.
    pub fn compose(token: &str, generated_on: NaiveDate) -> Result<Self, LedgerError> {
        let token = token.to_ascii_uppercase();
        if token.len() != BATCH_TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(LedgerError::validation(
                "batch_number",
                format!("token must be {BATCH_TOKEN_LEN} alphanumerics, got {token:?}"),
            ));
        }
        Ok(Self(format!(
            "{BATCH_PREFIX}{token}-{}",
            generated_on.format("%Y%m%d")
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Day encoded in the suffix.
    pub fn generated_on(&self) -> Option<NaiveDate> {
        let date = self.0.rsplit('-').next()?;
        NaiveDate::parse_from_str(date, "%Y%m%d").ok()
    }
}

impl FromStr for BatchNumber {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::validation("batch_number", format!("malformed: {s:?}"));

        let rest = s.strip_prefix(BATCH_PREFIX).ok_or_else(invalid)?;
        let (token, date) = rest.split_once('-').ok_or_else(invalid)?;
        if token.len() != BATCH_TOKEN_LEN
            || !token
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if date.len() != 8 {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;
        Self::compose(token, date)
    }
}

impl TryFrom<String> for BatchNumber {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BatchNumber> for String {
    fn from(value: BatchNumber) -> Self {
        value.0
    }
}

impl fmt::Display for BatchNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
