//! Quote sources — where live prices for open positions come from.
//!
//! The [`QuoteSource`] trait abstracts over price providers so the position
//! view can mark positions without knowing where a price came from.
//! [`FallbackQuoteChain`] tries providers in order and returns the first
//! success. [`fetch_all`] quotes many symbols independently: a failure for
//! one symbol is reported for that symbol only.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// A price snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_percent: f64,
    pub source: String,
}

/// One provider's failure, kept for the exhausted-chain report.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    pub provider: String,
    pub reason: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

fn join_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Structured quote errors. Every variant is recoverable: the user can
/// retry or type the price in.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuoteError {
    #[error("symbol is required")]
    EmptySymbol,

    #[error("no quote for '{symbol}'")]
    NotFound { symbol: String },

    #[error("quote provider unavailable: {0}")]
    Unavailable(String),

    #[error(
        "no quote for '{symbol}' from any source ({}); enter the price manually",
        join_failures(.failures)
    )]
    Exhausted {
        symbol: String,
        failures: Vec<ProviderFailure>,
    },
}

/// Trait for quote providers.
pub trait QuoteSource: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Latest quote for `symbol`.
    fn quote(&self, symbol: &str) -> Result<Quote, QuoteError>;
}

/// Fixed price table: manual entry, config-supplied prices, tests.
#[derive(Debug, Clone, Default)]
pub struct StaticQuoteSource {
    name: String,
    prices: HashMap<String, f64>,
}

impl StaticQuoteSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prices: HashMap::new(),
        }
    }

    pub fn with_price(mut self, symbol: impl Into<String>, price: f64) -> Self {
        self.prices.insert(symbol.into(), price);
        self
    }

    pub fn from_prices<I, S>(name: impl Into<String>, prices: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            prices: prices.into_iter().map(|(s, p)| (s.into(), p)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl QuoteSource for StaticQuoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        match self.prices.get(symbol) {
            Some(&price) if price.is_finite() && price > 0.0 => Ok(Quote {
                symbol: symbol.to_string(),
                price,
                change: 0.0,
                change_percent: 0.0,
                source: self.name.clone(),
            }),
            _ => Err(QuoteError::NotFound {
                symbol: symbol.to_string(),
            }),
        }
    }
}

/// Ordered list of providers; the first success wins.
#[derive(Default)]
pub struct FallbackQuoteChain {
    providers: Vec<Box<dyn QuoteSource>>,
}

impl FallbackQuoteChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider. Providers are tried in insertion order.
    pub fn push(mut self, provider: impl QuoteSource + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for FallbackQuoteChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("FallbackQuoteChain")
            .field("providers", &names)
            .finish()
    }
}

impl QuoteSource for FallbackQuoteChain {
    fn name(&self) -> &str {
        "fallback-chain"
    }

    fn quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        if symbol.trim().is_empty() {
            return Err(QuoteError::EmptySymbol);
        }
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.quote(symbol) {
                Ok(quote) => {
                    debug!(
                        symbol,
                        provider = provider.name(),
                        price = quote.price,
                        "quote fetched"
                    );
                    return Ok(quote);
                }
                Err(err) => {
                    warn!(
                        symbol,
                        provider = provider.name(),
                        error = %err,
                        "quote provider failed, trying next"
                    );
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        Err(QuoteError::Exhausted {
            symbol: symbol.to_string(),
            failures,
        })
    }
}

/// Quote every distinct symbol in parallel.
///
/// Each symbol gets its own result; one failure never blocks or alters
/// another symbol's quote. Output is keyed and ordered by symbol.
pub fn fetch_all<S>(source: &S, symbols: &[&str]) -> BTreeMap<String, Result<Quote, QuoteError>>
where
    S: QuoteSource + ?Sized,
{
    let mut unique: Vec<&str> = symbols.to_vec();
    unique.sort_unstable();
    unique.dedup();

    unique
        .par_iter()
        .map(|symbol| (symbol.to_string(), source.quote(symbol)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing(&'static str);

    impl QuoteSource for Failing {
        fn name(&self) -> &str {
            self.0
        }

        fn quote(&self, _symbol: &str) -> Result<Quote, QuoteError> {
            Err(QuoteError::Unavailable("rate limited".into()))
        }
    }

    #[test]
    fn static_source_quotes_known_symbols() {
        let source = StaticQuoteSource::new("manual").with_price("AAPL", 190.5);
        let q = source.quote("AAPL").unwrap();
        assert_eq!(q.price, 190.5);
        assert_eq!(q.source, "manual");
        assert!(matches!(source.quote("MSFT"), Err(QuoteError::NotFound { .. })));
    }

    #[test]
    fn chain_falls_through_to_first_success() {
        let chain = FallbackQuoteChain::new()
            .push(Failing("primary"))
            .push(StaticQuoteSource::new("secondary").with_price("AAPL", 10.0))
            .push(StaticQuoteSource::new("tertiary").with_price("AAPL", 99.0));
        let q = chain.quote("AAPL").unwrap();
        assert_eq!(q.source, "secondary");
        assert_eq!(q.price, 10.0);
    }

    #[test]
    fn chain_reports_every_failure_when_exhausted() {
        let chain = FallbackQuoteChain::new()
            .push(Failing("primary"))
            .push(StaticQuoteSource::new("secondary"));
        match chain.quote("AAPL") {
            Err(QuoteError::Exhausted { symbol, failures }) => {
                assert_eq!(symbol, "AAPL");
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].provider, "primary");
            }
            other => panic!("expected exhausted, got {other:?}"),
        }
    }

    #[test]
    fn exhausted_message_suggests_manual_entry() {
        let err = FallbackQuoteChain::new().quote("AAPL").unwrap_err();
        assert!(err.to_string().contains("enter the price manually"));
    }

    #[test]
    fn empty_symbol_is_rejected() {
        let chain = FallbackQuoteChain::new().push(StaticQuoteSource::new("m"));
        assert_eq!(chain.quote("  "), Err(QuoteError::EmptySymbol));
    }

    #[test]
    fn fetch_all_isolates_failures() {
        let source = StaticQuoteSource::new("manual")
            .with_price("AAPL", 1.0)
            .with_price("TSLA", 2.0);
        let results = fetch_all(&source, &["TSLA", "AAPL", "NOPE", "AAPL"]);
        assert_eq!(results.len(), 3);
        assert_eq!(results["AAPL"].as_ref().unwrap().price, 1.0);
        assert_eq!(results["TSLA"].as_ref().unwrap().price, 2.0);
        assert!(results["NOPE"].is_err());
    }
}
