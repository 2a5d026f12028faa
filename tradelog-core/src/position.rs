//! Position P&L and risk/reward calculator.
//!
//! Pure functions over a single [`TradeRecord`]: unrealized P&L at a
//! reference price, realized P&L and R:R at close, and the per-position rows
//! shown on the open-positions view. Nothing here touches storage; closing a
//! position returns the updated record and persisting it is the caller's job.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{NewTrade, TradeId, TradeRecord, TradeType, UNTAGGED};

/// Errors from closing a position.
#[derive(Debug, Error, PartialEq)]
pub enum PositionError {
    #[error("trade {id} is already closed")]
    AlreadyClosed { id: TradeId },

    #[error("invalid exit price {0}: must be a positive number")]
    InvalidExitPrice(f64),
}

/// Parse a user-entered price.
///
/// Accepts surrounding whitespace and a leading `$`. Empty, non-numeric,
/// non-finite and zero input all yield `None`, which callers treat as "use
/// the entry price".
pub fn parse_price(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p != 0.0)
}

/// Resolve the price to mark a position at.
fn mark_price(position: &TradeRecord, current_price: Option<f64>) -> f64 {
    current_price
        .filter(|p| p.is_finite() && *p != 0.0)
        .unwrap_or(position.entry_price)
}

/// Directional P&L of moving from `entry` to `price` with `quantity` units.
pub fn realized_pl(trade_type: TradeType, entry: f64, price: f64, quantity: f64) -> f64 {
    match trade_type {
        TradeType::Long => (price - entry) * quantity,
        TradeType::Short => (entry - price) * quantity,
    }
}

/// Unrealized P&L of an open position at `current_price`.
///
/// A missing or unusable price marks the position at its entry price, so
/// the result is 0 until a quote or manual price arrives.
pub fn unrealized_pl(position: &TradeRecord, current_price: Option<f64>) -> f64 {
    let price = mark_price(position, current_price);
    realized_pl(
        position.trade_type,
        position.entry_price,
        price,
        position.quantity,
    )
}

/// Percentage move from entry, sign-flipped for shorts. Display only.
pub fn pl_percent(position: &TradeRecord, current_price: Option<f64>) -> f64 {
    if position.entry_price == 0.0 {
        return 0.0;
    }
    let price = mark_price(position, current_price);
    (price - position.entry_price) / position.entry_price * 100.0 * position.trade_type.sign()
}

/// Reward-to-risk for a realized `profit_loss`.
///
/// Risk is the stop distance times size. Returns `None` when no stop is set
/// (a zero stop counts as unset) or the stop sits exactly at entry.
pub fn risk_reward(position: &TradeRecord, profit_loss: f64) -> Option<f64> {
    let stop = position.stop_loss.filter(|s| *s != 0.0)?;
    let risk = (position.entry_price - stop).abs() * position.quantity;
    if risk > 0.0 {
        Some(profit_loss.abs() / risk)
    } else {
        None
    }
}

/// Close an open position at `exit_price` on `exit_date`.
///
/// Sets `exit_price`, `profit_loss` and `date` (overwritten with the exit
/// date). `risk_reward_ratio` is recomputed when a usable stop exists and
/// otherwise keeps its prior value.
pub fn close(
    position: &TradeRecord,
    exit_price: f64,
    exit_date: &str,
) -> Result<TradeRecord, PositionError> {
    if position.is_closed() {
        return Err(PositionError::AlreadyClosed {
            id: position.id.clone(),
        });
    }
    if !exit_price.is_finite() || exit_price <= 0.0 {
        return Err(PositionError::InvalidExitPrice(exit_price));
    }

    let profit_loss = realized_pl(
        position.trade_type,
        position.entry_price,
        exit_price,
        position.quantity,
    );

    let mut closed = position.clone();
    closed.exit_price = exit_price;
    closed.profit_loss = profit_loss;
    closed.risk_reward_ratio = risk_reward(position, profit_loss).or(position.risk_reward_ratio);
    closed.date = exit_date.to_string();
    Ok(closed)
}

/// Turn trade-entry input into a stored record.
///
/// With an exit price the trade is booked closed, with P&L and (given a
/// stop) R:R filled in. Without one it is booked as an open position.
pub fn book(id: TradeId, input: NewTrade) -> TradeRecord {
    let exit_price = input.exit_price.filter(|p| *p > 0.0).unwrap_or(0.0);

    let mut record = TradeRecord {
        id,
        date: input.date,
        symbol: input.symbol,
        trade_type: input.trade_type,
        quantity: input.quantity,
        entry_price: input.entry_price,
        exit_price,
        stop_loss: input.stop_loss,
        risk_amount: input.risk_amount,
        strategy: if input.strategy.trim().is_empty() {
            UNTAGGED.to_string()
        } else {
            input.strategy
        },
        profit_loss: 0.0,
        risk_reward_ratio: None,
        notes: input.notes.filter(|n| !n.is_empty()),
        created_at: None,
        updated_at: None,
    };

    if record.is_closed() {
        record.profit_loss = realized_pl(
            record.trade_type,
            record.entry_price,
            exit_price,
            record.quantity,
        );
        record.risk_reward_ratio = risk_reward(&record, record.profit_loss);
    }
    record
}

/// Book an edited version of `existing`: same ID and stamps, with P&L and
/// R:R derived from `input` exactly as on creation. Removing the stop
/// clears R:R; removing the exit reopens the position.
pub fn rebook(existing: &TradeRecord, input: NewTrade) -> TradeRecord {
    let mut record = book(existing.id.clone(), input);
    record.created_at = existing.created_at;
    record.updated_at = existing.updated_at;
    record
}

/// Days a position has been held, rounded up: any part of `today` counts as
/// a full day, so a position opened today shows 1. A future entry date gives
/// the whole days until it. `None` for an unparseable entry date.
pub fn days_held(entry_date: &str, today: NaiveDate) -> Option<i64> {
    let entry = NaiveDate::parse_from_str(entry_date.trim(), "%Y-%m-%d").ok()?;
    let elapsed = (today - entry).num_days();
    Some(if elapsed >= 0 { elapsed + 1 } else { -elapsed })
}

/// One row of the open-positions view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    pub id: TradeId,
    pub symbol: String,
    pub trade_type: TradeType,
    pub strategy: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub current_price: f64,
    pub unrealized_pl: f64,
    pub pl_percent: f64,
    pub market_value: f64,
    pub stop_loss: Option<f64>,
    pub days_held: Option<i64>,
}

/// Open positions marked to market, with portfolio totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionsSummary {
    pub positions: Vec<PositionView>,
    pub total_unrealized_pl: f64,
    pub total_position_value: f64,
}

impl PositionsSummary {
    /// Mark every open trade in `trades` using `price_for`.
    ///
    /// Closed trades are skipped. `price_for` returning `None` marks the
    /// position at entry.
    pub fn compute<F>(trades: &[TradeRecord], price_for: F, today: NaiveDate) -> Self
    where
        F: Fn(&TradeRecord) -> Option<f64>,
    {
        let positions: Vec<PositionView> = trades
            .iter()
            .filter(|t| t.is_open())
            .map(|t| {
                let quoted = price_for(t);
                let current_price = mark_price(t, quoted);
                PositionView {
                    id: t.id.clone(),
                    symbol: t.symbol.clone(),
                    trade_type: t.trade_type,
                    strategy: t.strategy_tag().to_string(),
                    quantity: t.quantity,
                    entry_price: t.entry_price,
                    current_price,
                    unrealized_pl: unrealized_pl(t, quoted),
                    pl_percent: pl_percent(t, quoted),
                    market_value: current_price * t.quantity,
                    stop_loss: t.stop_loss,
                    days_held: days_held(&t.date, today),
                }
            })
            .collect();

        let total_unrealized_pl = positions.iter().map(|p| p.unrealized_pl).sum();
        let total_position_value = positions.iter().map(|p| p.market_value).sum();

        Self {
            positions,
            total_unrealized_pl,
            total_position_value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
