//! Cumulative P&L curve for the dashboard chart.

use serde::{Deserialize, Serialize};
use tradelog_core::TradeRecord;

/// One point on the equity curve: running P&L after the trade on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: String,
    pub equity: f64,
}

/// Trades ordered by date (stable for equal dates), P&L accumulated.
///
/// Dates compare as strings, which is chronological for ISO `YYYY-MM-DD`.
pub fn equity_curve(trades: &[TradeRecord]) -> Vec<EquityPoint> {
    let mut ordered: Vec<&TradeRecord> = trades.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date));

    let mut running = 0.0;
    ordered
        .into_iter()
        .map(|t| {
            running += t.profit_loss;
            EquityPoint {
                date: t.date.clone(),
                equity: running,
            }
        })
        .collect()
}

/// Largest peak-to-trough drop of the curve, as a non-negative amount.
pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    let mut peak = 0.0_f64;
    let mut worst = 0.0_f64;
    for point in curve {
        peak = peak.max(point.equity);
        worst = worst.max(peak - point.equity);
    }
    worst
}
