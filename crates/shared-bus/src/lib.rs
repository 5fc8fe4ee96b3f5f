//! # Shared Bus - Ledger Change Feed
//!
//! Optional real-time feed of "record appended" and "record updated" events.
//! UI layers subscribe to refresh their views.
//!
//! ## Delivery Rules
//!
//! - Events are published only after the atomic write they describe succeeded.
//! - Delivery is fire-and-forget and at-most-once per event.
//! - Ledger correctness never depends on a subscriber being present.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐  subscribe()  ┌──────────────┐
//! │ Ledger core  │ ────────────→ │  Event Bus   │ ────────────→ │  UI / audit  │
//! └──────────────┘               └──────────────┘               └──────────────┘
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, LedgerEvent};
pub use publisher::{EventPublisher, InMemoryEventBus, NoopPublisher};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging subscribers drop events.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
