//! Configuration for the provenance ledger

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Upper bound on batch-number regeneration after a collision.
pub const MAX_BATCH_NUMBER_RETRIES: u32 = 3;

/// Ledger configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Deadline for every record store call (milliseconds)
    pub store_timeout_ms: u64,
    /// Fresh batch numbers to try after a collision
    pub batch_number_retries: u32,
    /// Default listing price markup over the crop's unit price
    pub listing_markup_percent: u32,
    /// Length of the random part of each salt
    pub salt_nonce_len: usize,
    /// Change feed buffer
    pub event_channel_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5_000,
            batch_number_retries: 1,
            listing_markup_percent: 30,
            salt_nonce_len: 13,
            event_channel_capacity: 1_000,
        }
    }
}

/// Rejected configuration values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("store timeout must be greater than zero")]
    ZeroStoreTimeout,

    #[error("salt nonce length must be greater than zero")]
    ZeroNonceLength,

    #[error("batch number retries {got} exceeds maximum {max}")]
    TooManyRetries { got: u32, max: u32 },

    #[error("event channel capacity must be greater than zero")]
    ZeroEventCapacity,
}

impl LedgerConfig {
    /// Defaults overridden by `LEDGER_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` over an arbitrary key lookup.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut config = Self::default();

        override_from(&lookup, "LEDGER_STORE_TIMEOUT_MS", &mut config.store_timeout_ms);
        override_from(&lookup, "LEDGER_BATCH_RETRIES", &mut config.batch_number_retries);
        override_from(
            &lookup,
            "LEDGER_LISTING_MARKUP_PERCENT",
            &mut config.listing_markup_percent,
        );
        override_from(&lookup, "LEDGER_SALT_NONCE_LEN", &mut config.salt_nonce_len);
        override_from(&lookup, "LEDGER_EVENT_CAPACITY", &mut config.event_channel_capacity);

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::ZeroStoreTimeout);
        }
        if self.salt_nonce_len == 0 {
            return Err(ConfigError::ZeroNonceLength);
        }
        if self.batch_number_retries > MAX_BATCH_NUMBER_RETRIES {
            return Err(ConfigError::TooManyRetries {
                got: self.batch_number_retries,
                max: MAX_BATCH_NUMBER_RETRIES,
            });
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn override_from<F, T>(lookup: &F, key: &str, field: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => {
            *field = value;
            info!(key, value = %raw, "Loaded ledger setting from environment");
        }
        Err(_) => warn!(key, value = %raw, "Ignoring unparseable ledger setting"),
    }
}
