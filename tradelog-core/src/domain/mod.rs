//! Domain types for the trade journal.

pub mod ids;
pub mod trade;

pub use ids::TradeId;
pub use trade::{NewTrade, TradePatch, TradeRecord, TradeType, UNTAGGED};

/// Symbol type alias
pub type Symbol = String;
