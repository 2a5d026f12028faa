//! tradelog analytics — aggregate views over a trade history.
//!
//! This crate turns the flat journal into the numbers the analytics and
//! dashboard screens show, and renders them for export:
//! - Performance snapshot (win rate, profit factor, streaks, long/short split)
//! - Monthly, per-symbol and per-strategy breakdowns
//! - Cumulative equity curve
//! - Trade-list filtering
//! - CSV / JSON / Markdown export
//! - TOML configuration

pub mod buckets;
pub mod config;
pub mod equity;
pub mod export;
pub mod filter;
pub mod metrics;

pub use buckets::{MonthlyBucket, StrategyBucket, SymbolBucket};
pub use config::{AccessConfig, ConfigError, JournalConfig, LoggingConfig};
pub use equity::EquityPoint;
pub use export::ExportError;
pub use filter::TradeFilter;
pub use metrics::{AnalyticsEngine, AnalyticsError, AnalyticsSnapshot, ProfitFactor};
