//! State management for Pennybook.
//!
//! This module provides centralized state management: a single in-memory
//! aggregate loaded from the journal's data endpoints, mutated through the
//! [`StateManager`], with every change published on the event bus.

mod account_state;
mod analytics_state;
mod local;
mod manager;
mod trade_state;

pub use account_state::{AccountConfig, AccountState, DEFAULT_STARTING_BALANCE, Deposit};
pub use analytics_state::AnalyticsState;
pub use local::LocalAccountStore;
pub use manager::StateManager;
pub use trade_state::{TradeRecord, TradeState, TradeStatistics, TradesDocument};

use serde::{Deserialize, Serialize};

/// The full application state aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    /// Account subtree.
    pub account: AccountState,
    /// Trades subtree.
    pub trades: TradeState,
    /// Analytics subtree.
    pub analytics: AnalyticsState,
}
