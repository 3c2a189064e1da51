//! Conversion from wire documents to state subtrees.

use crate::state::{
    AccountConfig, AccountState, DEFAULT_STARTING_BALANCE, TradeState, TradesDocument,
};
use rust_decimal::Decimal;

/// Converts journal documents into state subtrees.
pub struct DataConverter;

impl DataConverter {
    /// Derive the account subtree from a config document and the current
    /// total P&L, keeping the portfolio-value invariant intact.
    pub fn account_state(config: &AccountConfig, total_pnl: Decimal) -> AccountState {
        let starting_balance = config.starting_balance.unwrap_or(DEFAULT_STARTING_BALANCE);
        let total_deposits: Decimal = config.deposits.iter().map(|d| d.amount).sum();

        AccountState {
            starting_balance,
            deposits: config.deposits.clone(),
            total_deposits,
            portfolio_value: starting_balance + total_deposits + total_pnl,
        }
    }

    /// Derive the trades subtree from a trade index document.
    pub fn trade_state(document: TradesDocument) -> TradeState {
        let total_pnl = document.statistics.total_pnl;
        TradeState {
            trades: document.trades,
            statistics: document.statistics,
            total_pnl,
        }
    }
}
