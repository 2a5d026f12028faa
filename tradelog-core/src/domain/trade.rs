//! TradeRecord — one journal entry, open or closed.

use super::ids::TradeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy label used when a trade was logged without one.
pub const UNTAGGED: &str = "Untagged";

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Long,
    Short,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Long => "long",
            TradeType::Short => "short",
        }
    }

    /// +1 for long, -1 for short. Multiplies a raw price move into P&L.
    pub fn sign(&self) -> f64 {
        match self {
            TradeType::Long => 1.0,
            TradeType::Short => -1.0,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            TradeType::Long => TradeType::Short,
            TradeType::Short => TradeType::Long,
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for TradeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(TradeType::Long),
            "short" => Ok(TradeType::Short),
            other => Err(format!("unknown trade type '{other}' (expected long or short)")),
        }
    }
}

/// A single journal entry.
///
/// A record is closed iff `exit_price > 0`. While open, `profit_loss` is 0
/// and `risk_reward_ratio` is whatever the entry form stored (normally none).
/// `date` is the entry date for open positions and is overwritten with the
/// exit date when the position closes, so date-based grouping buckets by
/// close month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub id: TradeId,

    // ── Identification ──
    pub date: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub trade_type: TradeType,

    // ── Size & prices ──
    pub quantity: f64,
    pub entry_price: f64,
    #[serde(default)]
    pub exit_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_amount: Option<f64>,

    // ── Classification ──
    #[serde(default)]
    pub strategy: String,

    // ── Outcome ──
    #[serde(default)]
    pub profit_loss: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_reward_ratio: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    // ── Bookkeeping ──
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TradeRecord {
    pub fn is_closed(&self) -> bool {
        self.exit_price > 0.0
    }

    pub fn is_open(&self) -> bool {
        !self.is_closed()
    }

    pub fn is_win(&self) -> bool {
        self.profit_loss > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.profit_loss < 0.0
    }

    /// Stored strategy, with empty labels reported as [`UNTAGGED`].
    pub fn strategy_tag(&self) -> &str {
        if self.strategy.is_empty() {
            UNTAGGED
        } else {
            &self.strategy
        }
    }

    /// `YYYY-MM` prefix of `date`. Shorter dates are returned whole.
    pub fn month_key(&self) -> String {
        self.date.chars().take(7).collect()
    }

    /// Realized return as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.quantity == 0.0 {
            return 0.0;
        }
        self.profit_loss / (self.entry_price * self.quantity)
    }

    /// Entry notional.
    pub fn cost_basis(&self) -> f64 {
        self.entry_price * self.quantity
    }
}

/// Input for logging a new trade or opening a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrade {
    pub date: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub quantity: f64,
    pub entry_price: f64,
    /// `None` (or 0) opens a position instead of logging a closed trade.
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub risk_amount: Option<f64>,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTrade {
    /// The user-entered fields of a stored record, ready to be edited and
    /// booked again. An open position comes back without an exit price.
    pub fn from_record(record: &TradeRecord) -> Self {
        Self {
            date: record.date.clone(),
            symbol: record.symbol.clone(),
            trade_type: record.trade_type,
            quantity: record.quantity,
            entry_price: record.entry_price,
            exit_price: Some(record.exit_price).filter(|p| *p > 0.0),
            stop_loss: record.stop_loss,
            risk_amount: record.risk_amount,
            strategy: record.strategy.clone(),
            notes: record.notes.clone(),
        }
    }
}

/// Partial update applied by `TradeRepository::update`.
///
/// Fields left as `None` keep their stored value. Nothing is recomputed:
/// callers that change prices are expected to send the matching P&L, or to
/// re-book the record with `position::rebook` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePatch {
    pub date: Option<String>,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub trade_type: Option<TradeType>,
    pub quantity: Option<f64>,
    pub entry_price: Option<f64>,
    pub exit_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub risk_amount: Option<f64>,
    pub strategy: Option<String>,
    pub profit_loss: Option<f64>,
    pub risk_reward_ratio: Option<f64>,
    pub notes: Option<String>,
}

impl TradePatch {
    /// A patch that overwrites every mutable field with `record`'s values.
    pub fn from_record(record: &TradeRecord) -> Self {
        Self {
            date: Some(record.date.clone()),
            symbol: Some(record.symbol.clone()),
            trade_type: Some(record.trade_type),
            quantity: Some(record.quantity),
            entry_price: Some(record.entry_price),
            exit_price: Some(record.exit_price),
            stop_loss: record.stop_loss,
            risk_amount: record.risk_amount,
            strategy: Some(record.strategy.clone()),
            profit_loss: Some(record.profit_loss),
            risk_reward_ratio: record.risk_reward_ratio,
            notes: record.notes.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, record: &mut TradeRecord) {
        if let Some(v) = &self.date {
            record.date = v.clone();
        }
        if let Some(v) = &self.symbol {
            record.symbol = v.clone();
        }
        if let Some(v) = self.trade_type {
            record.trade_type = v;
        }
        if let Some(v) = self.quantity {
            record.quantity = v;
        }
        if let Some(v) = self.entry_price {
            record.entry_price = v;
        }
        if let Some(v) = self.exit_price {
            record.exit_price = v;
        }
        if let Some(v) = self.stop_loss {
            record.stop_loss = Some(v);
        }
        if let Some(v) = self.risk_amount {
            record.risk_amount = Some(v);
        }
        if let Some(v) = &self.strategy {
            record.strategy = v.clone();
        }
        if let Some(v) = self.profit_loss {
            record.profit_loss = v;
        }
        if let Some(v) = self.risk_reward_ratio {
            record.risk_reward_ratio = Some(v);
        }
        if let Some(v) = &self.notes {
            record.notes = Some(v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            id: TradeId::new("t1"),
            date: "2024-01-11".into(),
            symbol: "SPY".into(),
            trade_type: TradeType::Long,
            quantity: 50.0,
            entry_price: 100.0,
            exit_price: 110.0,
            stop_loss: Some(95.0),
            risk_amount: None,
            strategy: String::new(),
            profit_loss: 500.0,
            risk_reward_ratio: Some(2.0),
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn closed_iff_exit_price_positive() {
        let mut t = sample_trade();
        assert!(t.is_closed());
        t.exit_price = 0.0;
        assert!(t.is_open());
    }

    #[test]
    fn empty_strategy_reads_as_untagged() {
        let mut t = sample_trade();
        assert_eq!(t.strategy_tag(), UNTAGGED);
        t.strategy = "Breakout".into();
        assert_eq!(t.strategy_tag(), "Breakout");
    }

    #[test]
    fn month_key_is_date_prefix() {
        let mut t = sample_trade();
        assert_eq!(t.month_key(), "2024-01");
        t.date = "2024".into();
        assert_eq!(t.month_key(), "2024");
        t.date = String::new();
        assert_eq!(t.month_key(), "");
    }

    #[test]
    fn return_pct_calculation() {
        let t = sample_trade();
        assert!((t.return_pct() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn wire_format_is_camel_case() {
        let json = serde_json::to_value(sample_trade()).unwrap();
        assert_eq!(json["type"], "long");
        assert_eq!(json["entryPrice"], 100.0);
        assert_eq!(json["profitLoss"], 500.0);
        assert_eq!(json["riskRewardRatio"], 2.0);
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn missing_outcome_fields_default_to_open() {
        let json = r#"{"id":"x","date":"2024-02-01","symbol":"QQQ","type":"short",
                       "quantity":3,"entryPrice":400}"#;
        let t: TradeRecord = serde_json::from_str(json).unwrap();
        assert!(t.is_open());
        assert_eq!(t.profit_loss, 0.0);
        assert_eq!(t.strategy_tag(), UNTAGGED);
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut t = sample_trade();
        let patch = TradePatch {
            notes: Some("trimmed early".into()),
            exit_price: Some(105.0),
            ..Default::default()
        };
        patch.apply(&mut t);
        assert_eq!(t.exit_price, 105.0);
        assert_eq!(t.notes.as_deref(), Some("trimmed early"));
        // profit_loss is not recomputed by a patch
        assert_eq!(t.profit_loss, 500.0);
        assert_eq!(t.symbol, "SPY");
    }

    #[test]
    fn trade_type_parses_case_insensitively() {
        assert_eq!("LONG".parse::<TradeType>().unwrap(), TradeType::Long);
        assert_eq!(" short ".parse::<TradeType>().unwrap(), TradeType::Short);
        assert!("flat".parse::<TradeType>().is_err());
    }
}
