//! Trade-list filtering for the journal table and export.

use serde::{Deserialize, Serialize};
use tradelog_core::TradeRecord;

/// Criteria for narrowing a trade list. The default keeps every closed trade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeFilter {
    /// Case-insensitive substring of the symbol or the notes.
    pub search: Option<String>,
    /// Exact strategy tag (empty strategies match `Untagged`).
    pub strategy: Option<String>,
    /// Inclusive lower bound on `date`, compared as a string.
    pub start_date: Option<String>,
    /// Inclusive upper bound on `date`, compared as a string.
    pub end_date: Option<String>,
    /// Also keep open positions.
    pub include_open: bool,
}

impl TradeFilter {
    pub fn is_active(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.is_empty())
            || self.strategy.as_deref().is_some_and(|s| !s.is_empty())
            || self.start_date.as_deref().is_some_and(|s| !s.is_empty())
            || self.end_date.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn matches(&self, trade: &TradeRecord) -> bool {
        if !self.include_open && !trade.is_closed() {
            return false;
        }

        if let Some(term) = non_empty(&self.search) {
            let needle = term.to_lowercase();
            let in_symbol = trade.symbol.to_lowercase().contains(&needle);
            let in_notes = trade
                .notes
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&needle));
            if !in_symbol && !in_notes {
                return false;
            }
        }

        if let Some(strategy) = non_empty(&self.strategy) {
            if trade.strategy_tag() != strategy {
                return false;
            }
        }

        if let Some(start) = non_empty(&self.start_date) {
            if trade.date.as_str() < start {
                return false;
            }
        }
        if let Some(end) = non_empty(&self.end_date) {
            if trade.date.as_str() > end {
                return false;
            }
        }
        true
    }

    /// Matching trades in input order.
    pub fn apply(&self, trades: &[TradeRecord]) -> Vec<TradeRecord> {
        trades.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
