//! Centralized state manager.
//!
//! Single source of truth for the application state. Loads every subtree
//! from the journal's data endpoints, keeps the portfolio-value invariant,
//! and publishes each change on the event bus so renderers never poll.

use super::{AccountConfig, AppState, AccountState, AnalyticsState, LocalAccountStore, TradeState, TradesDocument};
use crate::api::{DataClient, DataConverter};
use crate::error::Result;
use crate::events::{Event, EventBus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// Owns the application state and its loading lifecycle.
pub struct StateManager {
    state: RwLock<AppState>,
    client: DataClient,
    bus: EventBus,
    local: LocalAccountStore,
    initialized: AtomicBool,
}

impl StateManager {
    /// Create a manager with default state.
    pub fn new(client: DataClient, bus: EventBus, local: LocalAccountStore) -> Self {
        Self {
            state: RwLock::new(AppState::default()),
            client,
            bus,
            local,
            initialized: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Load all subtrees and announce the initial state.
    pub async fn init(&self) {
        info!("initializing state");
        self.load_all().await;
        self.initialized.store(true, Ordering::SeqCst);
        self.bus.emit(Event::StateInitialized(self.state()));
        info!("state initialized");
    }

    /// Re-run every load and announce the refreshed state.
    pub async fn refresh(&self) {
        info!("refreshing all data");
        self.load_all().await;
        self.bus.emit(Event::StateRefreshed(self.state()));
    }

    /// The three loads run concurrently and are independent; a slow or
    /// failing one never blocks or invalidates the others.
    async fn load_all(&self) {
        tokio::join!(self.load_account(), self.load_trades(), self.load_analytics());
    }

    async fn load_account(&self) {
        match self.client.fetch_account_config().await {
            Ok(config) => self.update_account(config),
            Err(error) => warn!(%error, "could not load account config"),
        }
        // Locally saved edits override the published config.
        match self.local.load() {
            Ok(Some(config)) => self.update_account(config),
            Ok(None) => {}
            Err(error) => warn!(%error, "could not load local account config"),
        }
    }

    async fn load_trades(&self) {
        match self.client.fetch_trades().await {
            Ok(document) => self.update_trades(document),
            Err(error) => warn!(%error, "could not load trades"),
        }
    }

    async fn load_analytics(&self) {
        match self.client.fetch_analytics().await {
            Ok(data) => self.update_analytics(data),
            Err(error) => warn!(%error, "could not load analytics"),
        }
    }

    /// Replace the account subtree from a config document.
    pub fn update_account(&self, config: AccountConfig) {
        let account = {
            let mut state = self.write();
            let account = DataConverter::account_state(&config, state.trades.total_pnl);
            state.account = account.clone();
            account
        };
        self.bus.emit(Event::AccountUpdated(account));
    }

    /// Replace the trades subtree and recompute the portfolio value.
    ///
    /// The account event fires after the trades event, and its payload
    /// already reflects the new P&L.
    pub fn update_trades(&self, document: TradesDocument) {
        let (trades, account) = {
            let mut state = self.write();
            state.trades = DataConverter::trade_state(document);
            let total_pnl = state.trades.total_pnl;
            state.account.recompute_portfolio_value(total_pnl);
            (state.trades.clone(), state.account.clone())
        };
        self.bus.emit(Event::TradesUpdated(trades));
        self.bus.emit(Event::AccountUpdated(account));
    }

    /// Replace the analytics subtree.
    pub fn update_analytics(&self, data: serde_json::Value) {
        {
            let mut state = self.write();
            state.analytics = AnalyticsState {
                data: Some(data.clone()),
                loaded: true,
            };
        }
        self.bus.emit(Event::AnalyticsUpdated(data));
    }

    /// Update the account and persist the config locally.
    pub fn save_account(&self, config: AccountConfig) -> Result<()> {
        self.local.save(&config)?;
        self.update_account(config);
        Ok(())
    }

    /// Whether the initial load has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Snapshot of the full state.
    pub fn state(&self) -> AppState {
        self.read().clone()
    }

    /// Snapshot of the account subtree.
    pub fn account(&self) -> AccountState {
        self.read().account.clone()
    }

    /// Snapshot of the trades subtree.
    pub fn trades(&self) -> TradeState {
        self.read().trades.clone()
    }

    /// Snapshot of the analytics subtree.
    pub fn analytics(&self) -> AnalyticsState {
        self.read().analytics.clone()
    }
}
