//! Bucketed breakdowns — monthly, per-symbol and per-strategy aggregates.
//!
//! All three share one accumulator: positive P&L adds to `profit` and the
//! absolute value of everything else adds to `loss` (zero adds nothing), so
//! `net_pl = profit - loss` always equals the bucket's summed P&L.
//! Buckets are returned in a fixed order: months newest first, symbols and
//! strategies by net P&L descending with ties in first-seen order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tradelog_core::sort::{FieldValue, Sortable};
use tradelog_core::TradeRecord;

use crate::metrics::round_1dp;

/// Running totals for one bucket.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    trades: usize,
    wins: usize,
    losses: usize,
    profit: f64,
    loss: f64,
    rr_sum: f64,
    rr_count: usize,
}

impl Tally {
    fn add(&mut self, trade: &TradeRecord) {
        self.trades += 1;
        if trade.profit_loss > 0.0 {
            self.wins += 1;
            self.profit += trade.profit_loss;
        } else {
            if trade.profit_loss < 0.0 {
                self.losses += 1;
            }
            self.loss += trade.profit_loss.abs();
        }
        if let Some(rr) = trade.risk_reward_ratio {
            self.rr_sum += rr;
            self.rr_count += 1;
        }
    }

    fn net_pl(&self) -> f64 {
        self.profit - self.loss
    }

    fn win_rate(&self) -> f64 {
        if self.trades == 0 {
            return 0.0;
        }
        round_1dp(self.wins as f64 / self.trades as f64 * 100.0)
    }

    fn avg_rr(&self) -> Option<f64> {
        if self.rr_count == 0 {
            None
        } else {
            Some(self.rr_sum / self.rr_count as f64)
        }
    }
}

/// Group trades by `key_fn`, keeping keys in first-seen order.
fn group<F>(trades: &[TradeRecord], key_fn: F) -> Vec<(String, Tally)>
where
    F: Fn(&TradeRecord) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Tally)> = Vec::new();
    for trade in trades {
        let key = key_fn(trade);
        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, Tally::default()));
                groups.len() - 1
            }
        };
        groups[slot].1.add(trade);
    }
    groups
}

fn by_net_desc(a: f64, b: f64) -> std::cmp::Ordering {
    b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
}

// ─── Monthly ────────────────────────────────────────────────────────

/// P&L for one calendar month (`YYYY-MM` prefix of the trade date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month: String,
    pub trades: usize,
    pub profit: f64,
    pub loss: f64,
    #[serde(rename = "netPL")]
    pub net_pl: f64,
}

/// Monthly buckets over all trades, newest month first.
pub fn monthly_buckets(trades: &[TradeRecord]) -> Vec<MonthlyBucket> {
    let mut buckets: Vec<MonthlyBucket> = group(trades, TradeRecord::month_key)
        .into_iter()
        .map(|(month, t)| MonthlyBucket {
            month,
            trades: t.trades,
            profit: t.profit,
            loss: t.loss,
            net_pl: t.net_pl(),
        })
        .collect();
    buckets.sort_by(|a, b| b.month.cmp(&a.month));
    buckets
}

impl Sortable for MonthlyBucket {
    fn field(&self, key: &str) -> FieldValue {
        match key {
            "month" => self.month.as_str().into(),
            "trades" => self.trades.into(),
            "profit" => self.profit.into(),
            "loss" => self.loss.into(),
            "netPL" | "net_pl" => self.net_pl.into(),
            _ => FieldValue::Missing,
        }
    }
}

// ─── Per symbol ─────────────────────────────────────────────────────

/// Aggregate for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolBucket {
    pub symbol: String,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub profit: f64,
    pub loss: f64,
    #[serde(rename = "netPL")]
    pub net_pl: f64,
    /// Percentage, one decimal.
    pub win_rate: f64,
}

/// Per-symbol buckets, best net P&L first. Symbols are case-sensitive.
pub fn symbol_buckets(trades: &[TradeRecord]) -> Vec<SymbolBucket> {
    let mut buckets: Vec<SymbolBucket> = group(trades, |t| t.symbol.clone())
        .into_iter()
        .map(|(symbol, t)| SymbolBucket {
            symbol,
            trades: t.trades,
            wins: t.wins,
            losses: t.losses,
            profit: t.profit,
            loss: t.loss,
            net_pl: t.net_pl(),
            win_rate: t.win_rate(),
        })
        .collect();
    buckets.sort_by(|a, b| by_net_desc(a.net_pl, b.net_pl));
    buckets
}

impl Sortable for SymbolBucket {
    fn field(&self, key: &str) -> FieldValue {
        match key {
            "symbol" => self.symbol.as_str().into(),
            "trades" => self.trades.into(),
            "wins" => self.wins.into(),
            "losses" => self.losses.into(),
            "profit" => self.profit.into(),
            "loss" => self.loss.into(),
            "netPL" | "net_pl" => self.net_pl.into(),
            "winRate" | "win_rate" => self.win_rate.into(),
            _ => FieldValue::Missing,
        }
    }
}

// ─── Per strategy ───────────────────────────────────────────────────

/// Aggregate for one strategy tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyBucket {
    pub strategy: String,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub profit: f64,
    pub loss: f64,
    #[serde(rename = "netPL")]
    pub net_pl: f64,
    /// Percentage, one decimal.
    pub win_rate: f64,
    /// Mean R:R over trades that carry one; `None` when none do.
    pub avg_rr: Option<f64>,
}

impl StrategyBucket {
    /// `avg_rr` for display: two decimals, or `-` when absent.
    pub fn avg_rr_display(&self) -> String {
        match self.avg_rr {
            Some(rr) => format!("{rr:.2}"),
            None => "-".to_string(),
        }
    }
}

/// Per-strategy buckets keyed by the normalized tag, best net P&L first.
pub fn strategy_buckets(trades: &[TradeRecord]) -> Vec<StrategyBucket> {
    let mut buckets: Vec<StrategyBucket> = group(trades, |t| t.strategy_tag().to_string())
        .into_iter()
        .map(|(strategy, t)| StrategyBucket {
            strategy,
            trades: t.trades,
            wins: t.wins,
            losses: t.losses,
            profit: t.profit,
            loss: t.loss,
            net_pl: t.net_pl(),
            win_rate: t.win_rate(),
            avg_rr: t.avg_rr(),
        })
        .collect();
    buckets.sort_by(|a, b| by_net_desc(a.net_pl, b.net_pl));
    buckets
}

impl Sortable for StrategyBucket {
    fn field(&self, key: &str) -> FieldValue {
        match key {
            "strategy" => self.strategy.as_str().into(),
            "trades" => self.trades.into(),
            "wins" => self.wins.into(),
            "losses" => self.losses.into(),
            "profit" => self.profit.into(),
            "loss" => self.loss.into(),
            "netPL" | "net_pl" => self.net_pl.into(),
            "winRate" | "win_rate" => self.win_rate.into(),
            "avgRR" | "avg_rr" => self.avg_rr.into(),
            _ => FieldValue::Missing,
        }
    }
}
