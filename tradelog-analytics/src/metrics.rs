//! Performance metrics — pure functions over a trade history, plus the
//! engine that assembles them into one snapshot.
//!
//! Every metric is a pure function: trade list in, scalar out. The engine
//! never mutates its input and performs no I/O.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use tradelog_core::{TradeRecord, TradeType};

use crate::buckets::{
    monthly_buckets, strategy_buckets, symbol_buckets, MonthlyBucket, StrategyBucket, SymbolBucket,
};
use crate::equity::{equity_curve, max_drawdown, EquityPoint};

/// Number of symbol buckets kept for charting when not configured.
pub const DEFAULT_TOP_SYMBOLS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("no trades to analyze")]
    EmptyHistory,
}

// ─── Profit factor ──────────────────────────────────────────────────

/// Gross profit over gross loss, with an explicit infinite case for
/// histories that have profit and no loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfitFactor {
    Finite(f64),
    Infinite,
}

impl ProfitFactor {
    /// `profit / loss` when `loss > 0`; `Infinite` when only profit exists;
    /// `Finite(0.0)` when both are zero.
    pub fn from_totals(total_profit: f64, total_loss: f64) -> Self {
        if total_loss > 0.0 {
            ProfitFactor::Finite(total_profit / total_loss)
        } else if total_profit > 0.0 {
            ProfitFactor::Infinite
        } else {
            ProfitFactor::Finite(0.0)
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, ProfitFactor::Infinite)
    }

    /// Numeric value, `f64::INFINITY` for the infinite case.
    pub fn value(&self) -> f64 {
        match self {
            ProfitFactor::Finite(v) => *v,
            ProfitFactor::Infinite => f64::INFINITY,
        }
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Finite(v) => write!(f, "{v:.2}"),
            ProfitFactor::Infinite => write!(f, "∞"),
        }
    }
}

const INFINITY_TAG: &str = "Infinity";

impl Serialize for ProfitFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProfitFactor::Finite(v) => serializer.serialize_f64(*v),
            ProfitFactor::Infinite => serializer.serialize_str(INFINITY_TAG),
        }
    }
}

impl<'de> Deserialize<'de> for ProfitFactor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(ProfitFactor::Finite(v)),
            Repr::Text(s) if s == INFINITY_TAG || s == "∞" => Ok(ProfitFactor::Infinite),
            Repr::Text(s) => Err(de::Error::custom(format!("invalid profit factor: {s}"))),
        }
    }
}

// ─── Snapshot ───────────────────────────────────────────────────────

/// Everything the analytics and dashboard views render, computed in one pass
/// over the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Trades with zero P&L, open positions included.
    pub flat_trades: usize,
    pub win_rate: f64,
    pub profit_factor: ProfitFactor,
    pub avg_win: f64,
    /// Non-negative magnitude.
    pub avg_loss: f64,
    pub largest_win: f64,
    /// Most negative single P&L (signed), 0 without losses.
    pub largest_loss: f64,
    pub total_profit: f64,
    /// Absolute value of summed losses.
    pub total_loss: f64,
    #[serde(rename = "netPL")]
    pub net_pl: f64,
    #[serde(rename = "avgRR")]
    pub avg_rr: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub long_trades: usize,
    pub short_trades: usize,
    pub long_win_rate: f64,
    pub short_win_rate: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub max_drawdown: f64,
    pub monthly: Vec<MonthlyBucket>,
    pub symbols: Vec<SymbolBucket>,
    pub top_symbols: Vec<SymbolBucket>,
    pub strategies: Vec<StrategyBucket>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Turns a trade history into an [`AnalyticsSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsEngine {
    top_symbols: usize,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_SYMBOLS)
    }
}

impl AnalyticsEngine {
    /// `top_symbols` caps the charting subset of the symbol breakdown.
    pub fn new(top_symbols: usize) -> Self {
        Self { top_symbols }
    }

    pub fn top_symbols(&self) -> usize {
        self.top_symbols
    }

    /// Compute the snapshot. Streaks follow the slice order as given.
    pub fn compute(&self, trades: &[TradeRecord]) -> Result<AnalyticsSnapshot, AnalyticsError> {
        if trades.is_empty() {
            return Err(AnalyticsError::EmptyHistory);
        }

        let wins = trades.iter().filter(|t| t.is_win()).count();
        let losses = trades.iter().filter(|t| t.is_loss()).count();
        let total_profit = total_profit(trades);
        let total_loss = total_loss(trades);
        let avg_win = average(total_profit, wins);
        let avg_loss = average(total_loss, losses);
        let (max_consecutive_wins, max_consecutive_losses) = max_consecutive(trades);

        let longs: Vec<TradeRecord> = side(trades, TradeType::Long);
        let shorts: Vec<TradeRecord> = side(trades, TradeType::Short);

        let symbols = symbol_buckets(trades);
        let top_symbols = symbols.iter().take(self.top_symbols).cloned().collect();
        let curve = equity_curve(trades);

        let snapshot = AnalyticsSnapshot {
            total_trades: trades.len(),
            wins,
            losses,
            flat_trades: trades.len() - wins - losses,
            win_rate: win_rate(trades),
            profit_factor: ProfitFactor::from_totals(total_profit, total_loss),
            avg_win,
            avg_loss,
            largest_win: largest_win(trades),
            largest_loss: largest_loss(trades),
            total_profit,
            total_loss,
            net_pl: total_profit - total_loss,
            avg_rr: avg_rr(avg_win, avg_loss, wins, losses),
            max_consecutive_wins,
            max_consecutive_losses,
            long_trades: longs.len(),
            short_trades: shorts.len(),
            long_win_rate: win_rate(&longs),
            short_win_rate: win_rate(&shorts),
            best_trade: best_trade(trades),
            worst_trade: worst_trade(trades),
            max_drawdown: max_drawdown(&curve),
            monthly: monthly_buckets(trades),
            symbols,
            top_symbols,
            strategies: strategy_buckets(trades),
            equity_curve: curve,
        };

        debug!(
            trades = snapshot.total_trades,
            wins = snapshot.wins,
            losses = snapshot.losses,
            months = snapshot.monthly.len(),
            symbols = snapshot.symbols.len(),
            strategies = snapshot.strategies.len(),
            "analytics snapshot computed"
        );
        Ok(snapshot)
    }
}

fn side(trades: &[TradeRecord], trade_type: TradeType) -> Vec<TradeRecord> {
    trades
        .iter()
        .filter(|t| t.trade_type == trade_type)
        .cloned()
        .collect()
}

// ─── Individual metric functions ────────────────────────────────────

/// Round to one decimal place, the precision win rates are reported at.
pub fn round_1dp(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage of trades with positive P&L, one decimal. 0 for no trades.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.is_win()).count();
    round_1dp(wins as f64 / trades.len() as f64 * 100.0)
}

/// Sum of positive P&L.
pub fn total_profit(trades: &[TradeRecord]) -> f64 {
    trades.iter().filter(|t| t.is_win()).map(|t| t.profit_loss).sum()
}

/// Absolute value of summed negative P&L.
pub fn total_loss(trades: &[TradeRecord]) -> f64 {
    trades
        .iter()
        .filter(|t| t.is_loss())
        .map(|t| t.profit_loss)
        .sum::<f64>()
        .abs()
}

/// `sum / count`, 0 when `count` is 0.
pub fn average(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Average win over average loss; 0 unless both sides are present.
pub fn avg_rr(avg_win: f64, avg_loss: f64, wins: usize, losses: usize) -> f64 {
    if wins == 0 || losses == 0 || avg_loss <= 0.0 {
        return 0.0;
    }
    avg_win / avg_loss
}

pub fn largest_win(trades: &[TradeRecord]) -> f64 {
    trades
        .iter()
        .filter(|t| t.is_win())
        .map(|t| t.profit_loss)
        .fold(0.0, f64::max)
}

pub fn largest_loss(trades: &[TradeRecord]) -> f64 {
    trades
        .iter()
        .filter(|t| t.is_loss())
        .map(|t| t.profit_loss)
        .fold(0.0, f64::min)
}

/// Highest single P&L across all trades, 0 for no trades.
pub fn best_trade(trades: &[TradeRecord]) -> f64 {
    trades
        .iter()
        .map(|t| t.profit_loss)
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// Lowest single P&L across all trades, 0 for no trades.
pub fn worst_trade(trades: &[TradeRecord]) -> f64 {
    trades
        .iter()
        .map(|t| t.profit_loss)
        .reduce(f64::min)
        .unwrap_or(0.0)
}

/// Longest win and loss runs in slice order.
///
/// A win resets the loss run and vice versa. Zero-P&L trades are skipped:
/// they neither extend nor break a run.
pub fn max_consecutive(trades: &[TradeRecord]) -> (usize, usize) {
    let (mut win_run, mut loss_run) = (0, 0);
    let (mut max_wins, mut max_losses) = (0, 0);

    for trade in trades {
        if trade.is_win() {
            win_run += 1;
            loss_run = 0;
            max_wins = max_wins.max(win_run);
        } else if trade.is_loss() {
            loss_run += 1;
            win_run = 0;
            max_losses = max_losses.max(loss_run);
        }
    }
    (max_wins, max_losses)
}
