//! Event system for Pennybook.
//!
//! State changes are broadcast as typed events on the [`EventBus`];
//! consumers subscribe by [`EventKind`] and receive the payload variant
//! for that kind, so payload shapes are checked at compile time.

mod bus;

pub use bus::{EventBus, Subscription};

use crate::state::{AccountState, AppState, TradeState};
use std::fmt;

/// Application events with their payloads.
#[derive(Debug, Clone)]
pub enum Event {
    /// Initial load finished; carries the full state snapshot.
    StateInitialized(AppState),
    /// A manual refresh finished; carries the full state snapshot.
    StateRefreshed(AppState),
    /// The account subtree was replaced.
    AccountUpdated(AccountState),
    /// The trades subtree was replaced.
    TradesUpdated(TradeState),
    /// The analytics payload was replaced; carries just the payload.
    AnalyticsUpdated(serde_json::Value),
}

impl Event {
    /// The discriminant used as the subscription key.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StateInitialized(_) => EventKind::StateInitialized,
            Event::StateRefreshed(_) => EventKind::StateRefreshed,
            Event::AccountUpdated(_) => EventKind::AccountUpdated,
            Event::TradesUpdated(_) => EventKind::TradesUpdated,
            Event::AnalyticsUpdated(_) => EventKind::AnalyticsUpdated,
        }
    }
}

/// Payload-free event discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StateInitialized,
    StateRefreshed,
    AccountUpdated,
    TradesUpdated,
    AnalyticsUpdated,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::StateInitialized => "state:initialized",
            EventKind::StateRefreshed => "state:refreshed",
            EventKind::AccountUpdated => "account:updated",
            EventKind::TradesUpdated => "trades:updated",
            EventKind::AnalyticsUpdated => "analytics:updated",
        };
        f.write_str(name)
    }
}
