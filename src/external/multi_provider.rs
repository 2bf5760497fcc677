use async_trait::async_trait;
use tracing::{info, warn};

use crate::external::quote_provider::{QuoteError, QuoteProvider};
use crate::models::{HistoryInterval, PriceBar, Quote, SymbolMatch};

/// Chains two quote providers, falling back to the second whenever the first
/// fails.
///
/// Strategy:
/// 1. Every request goes to the primary provider first
/// 2. Any primary failure (throttle, network, unknown symbol) retries on the
///    fallback provider
/// 3. Only when both fail does the caller see an error, combined so that a
///    symbol unknown to both reads as not-found rather than an outage
pub struct MultiProvider {
    primary: Box<dyn QuoteProvider>,
    fallback: Box<dyn QuoteProvider>,
}

impl MultiProvider {
    pub fn new(primary: Box<dyn QuoteProvider>, fallback: Box<dyn QuoteProvider>) -> Self {
        Self { primary, fallback }
    }
}

/// Collapses the two failures into the error the caller should act on.
///
/// Not-found only when both providers agree the symbol does not exist;
/// a throttle on either side surfaces as rate-limited so callers back off.
fn combine(what: &str, primary: QuoteError, fallback: QuoteError) -> QuoteError {
    match (&primary, &fallback) {
        (QuoteError::NotFound, QuoteError::NotFound) => QuoteError::NotFound,
        (QuoteError::RateLimited, _) | (_, QuoteError::RateLimited) => QuoteError::RateLimited,
        _ => QuoteError::BadResponse(format!(
            "{what} failed on both providers (primary: {primary}; fallback: {fallback})"
        )),
    }
}

#[async_trait]
impl QuoteProvider for MultiProvider {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let primary_err = match self.primary.get_quote(symbol).await {
            Ok(quote) => {
                info!("✓ Quote for {} from primary provider", symbol);
                return Ok(quote);
            }
            Err(QuoteError::RateLimited) => {
                info!("⚠️ Primary provider rate limited, trying fallback for {}", symbol);
                QuoteError::RateLimited
            }
            Err(e) => {
                warn!("Primary provider error for {}: {}. Trying fallback.", symbol, e);
                e
            }
        };

        match self.fallback.get_quote(symbol).await {
            Ok(quote) => {
                info!("✓ Quote for {} from fallback provider", symbol);
                Ok(quote)
            }
            Err(e) => {
                warn!("Fallback provider also failed for {}: {}", symbol, e);
                Err(combine("quote", primary_err, e))
            }
        }
    }

    async fn get_history(
        &self,
        symbol: &str,
        interval: HistoryInterval,
        bars: u32,
    ) -> Result<Vec<PriceBar>, QuoteError> {
        let primary_err = match self.primary.get_history(symbol, interval, bars).await {
            Ok(history) => return Ok(history),
            Err(e) => {
                warn!(
                    "Primary provider {} history failed for {}: {}. Trying fallback.",
                    interval.as_str(),
                    symbol,
                    e
                );
                e
            }
        };

        self.fallback
            .get_history(symbol, interval, bars)
            .await
            .map_err(|e| combine("history", primary_err, e))
    }

    async fn search(&self, keyword: &str) -> Result<Vec<SymbolMatch>, QuoteError> {
        match self.primary.search(keyword).await {
            Ok(matches) if !matches.is_empty() => return Ok(matches),
            Ok(_) => {
                info!("No results from primary provider for '{}', trying fallback", keyword);
            }
            Err(e) => {
                warn!("Primary provider search failed for '{}': {}", keyword, e);
            }
        }

        self.fallback.search(keyword).await
    }
}
