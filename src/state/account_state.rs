//! Account state: starting balance, deposits, and portfolio value.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Starting balance assumed when the account config doesn't provide one.
pub const DEFAULT_STARTING_BALANCE: Decimal = Decimal::ONE_THOUSAND;

/// A deposit into the trading account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Deposit {
    /// Deposited amount.
    pub amount: Decimal,
    /// Deposit date as recorded in the journal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Free-form note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The account configuration document as persisted in the journal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Initial capital. Defaults to [`DEFAULT_STARTING_BALANCE`] when absent.
    pub starting_balance: Option<Decimal>,
    /// Deposits made after the starting balance.
    pub deposits: Vec<Deposit>,
    /// Free-form notes attached to the config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Document schema version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// When the document was last written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Derived account state.
///
/// Invariant: `portfolio_value == starting_balance + total_deposits + total_pnl`,
/// recomputed whenever either side changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountState {
    /// Initial capital.
    pub starting_balance: Decimal,
    /// Deposits made after the starting balance.
    pub deposits: Vec<Deposit>,
    /// Sum of all deposit amounts.
    pub total_deposits: Decimal,
    /// Current portfolio value.
    pub portfolio_value: Decimal,
}

impl Default for AccountState {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE,
            deposits: Vec::new(),
            total_deposits: Decimal::ZERO,
            portfolio_value: Decimal::ZERO,
        }
    }
}

impl AccountState {
    /// Recompute the portfolio value from the given total P&L.
    pub fn recompute_portfolio_value(&mut self, total_pnl: Decimal) {
        self.portfolio_value = self.starting_balance + self.total_deposits + total_pnl;
    }

    /// Capital contributed by the account holder (balance plus deposits).
    pub fn contributed_capital(&self) -> Decimal {
        self.starting_balance + self.total_deposits
    }
}
