//! Trade state: raw trade records and aggregate statistics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single trade record from the journal's trade index.
///
/// Records come from journal entries with frontmatter; every field outside
/// the identifying ones is optional and defaults on absence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeRecord {
    /// Sequence number within the journal.
    pub trade_number: u32,
    /// Ticker symbol.
    pub ticker: String,
    /// "LONG" or "SHORT".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_size: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_price: Option<Decimal>,
    /// Realized P&L in dollars.
    pub pnl_usd: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl_percent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_reward_ratio: Option<Decimal>,
    /// Notes extracted from the journal entry body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Path of the source journal entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl TradeRecord {
    /// Check if this trade closed with a profit.
    pub fn is_winner(&self) -> bool {
        self.pnl_usd > Decimal::ZERO
    }
}

/// Aggregate statistics over all trades, as computed by the journal's
/// index generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeStatistics {
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    /// Win rate in percent.
    pub win_rate: Decimal,
    pub total_pnl: Decimal,
    pub avg_pnl: Decimal,
    pub avg_winner: Decimal,
    pub avg_loser: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub total_volume: Decimal,
    /// Largest peak-to-trough drop of cumulative P&L (non-positive).
    pub max_drawdown: Decimal,
    pub profit_factor: Decimal,
}

/// The trade index document as served by the journal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradesDocument {
    pub trades: Vec<TradeRecord>,
    pub statistics: TradeStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Trade state subtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeState {
    /// Raw trade records.
    pub trades: Vec<TradeRecord>,
    /// Aggregate statistics.
    pub statistics: TradeStatistics,
    /// Total realized P&L, lifted out of the statistics for the
    /// portfolio-value computation.
    pub total_pnl: Decimal,
}

impl TradeState {
    /// Trades that closed with a profit.
    pub fn winners(&self) -> Vec<&TradeRecord> {
        self.trades.iter().filter(|t| t.is_winner()).collect()
    }

    /// Trades that closed flat or at a loss.
    pub fn losers(&self) -> Vec<&TradeRecord> {
        self.trades.iter().filter(|t| !t.is_winner()).collect()
    }
}
