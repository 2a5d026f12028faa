//! tradelog core — journal domain types and the per-position calculator.
//!
//! This crate contains everything that works on a single trade or a flat
//! list of them without aggregating:
//! - Domain types (trade records, trade entry input, partial updates, IDs)
//! - Position calculator (unrealized/realized P&L, R:R, close, open-position view)
//! - Generic column sorting for tabular views
//! - Trade repository contract with JSON-file and in-memory stores
//! - Quote source contract with an ordered fallback chain

pub mod domain;
pub mod position;
pub mod quote;
pub mod repository;
pub mod sort;

pub use domain::{NewTrade, TradeId, TradePatch, TradeRecord, TradeType, UNTAGGED};
pub use position::{PositionError, PositionView, PositionsSummary};
pub use quote::{fetch_all, FallbackQuoteChain, Quote, QuoteError, QuoteSource, StaticQuoteSource};
pub use repository::{InMemoryRepository, JsonFileRepository, RepositoryError, TradeRepository};
pub use sort::{FieldValue, SortDirection, SortIndex, SortState, Sortable};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public types can cross threads.
    ///
    /// Quotes are fetched on rayon workers, so anything a worker touches
    /// has to stay Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<TradeRecord>();
        require_sync::<TradeRecord>();
        require_send::<NewTrade>();
        require_sync::<NewTrade>();
        require_send::<TradePatch>();
        require_sync::<TradePatch>();
        require_send::<PositionsSummary>();
        require_sync::<PositionsSummary>();
        require_send::<Quote>();
        require_sync::<Quote>();
        require_send::<QuoteError>();
        require_sync::<QuoteError>();
        require_send::<FallbackQuoteChain>();
        require_sync::<FallbackQuoteChain>();
        require_send::<SortIndex<TradeRecord>>();
        require_sync::<SortIndex<TradeRecord>>();
        require_send::<InMemoryRepository>();
        require_sync::<InMemoryRepository>();
    }

    #[test]
    fn quote_source_is_object_safe() {
        fn _takes_dyn(source: &dyn QuoteSource) -> Result<Quote, QuoteError> {
            source.quote("SPY")
        }
    }
}
