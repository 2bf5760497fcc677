use async_trait::async_trait;
use thiserror::Error;

use crate::models::{HistoryInterval, PriceBar, Quote, SymbolMatch};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("symbol not found")]
    NotFound,
}

/// A source of market data. Implementations are interchangeable behind
/// `Arc<dyn QuoteProvider>`; which one runs is decided at startup.
///
/// Implementations throttle themselves and never assume a caller-side
/// limiter. They must map "the symbol does not exist" to
/// [`QuoteError::NotFound`] so callers can cache the miss.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Current quote for one symbol.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, QuoteError>;

    /// Up to `bars` most recent OHLCV bars at the given interval,
    /// oldest first.
    async fn get_history(
        &self,
        symbol: &str,
        interval: HistoryInterval,
        bars: u32,
    ) -> Result<Vec<PriceBar>, QuoteError>;

    /// Symbols matching a free-text keyword, best match first.
    async fn search(&self, keyword: &str) -> Result<Vec<SymbolMatch>, QuoteError>;
}
