use chrono::Duration;
use tracing::warn;

use crate::errors::AppError;
use crate::external::{QuoteError, QuoteProvider};
use crate::models::{HistoryInterval, PriceBar, Quote};
use crate::services::quote_cache::{FailureKind, QuoteCache};

/// How long a cached quote counts as current. Within this window repeated
/// requests never touch the provider.
pub const QUOTE_FRESH_SECS: i64 = 60;

/// Longest price history a single request may ask for.
pub const MAX_HISTORY_BARS: u32 = 365;

/// A quote plus how it was obtained. `stale` means the provider failed and
/// the value came from the last successful fetch.
#[derive(Debug, Clone)]
pub struct ResolvedQuote {
    pub quote: Quote,
    pub stale: bool,
}

/// Resolves a quote through the cache, the provider, and the stale fallback,
/// in that order.
pub async fn get_quote(
    provider: &dyn QuoteProvider,
    cache: &QuoteCache,
    symbol: &str,
) -> Result<ResolvedQuote, AppError> {
    resolve(provider, cache, symbol, Duration::seconds(QUOTE_FRESH_SECS)).await
}

async fn resolve(
    provider: &dyn QuoteProvider,
    cache: &QuoteCache,
    symbol: &str,
    max_age: Duration,
) -> Result<ResolvedQuote, AppError> {
    if let Some(quote) = cache.fresh(symbol, max_age) {
        return Ok(ResolvedQuote {
            quote,
            stale: false,
        });
    }

    // A recorded failure skips the provider entirely until its TTL runs out.
    if let Some(kind) = cache.active_failure(symbol) {
        return match kind {
            FailureKind::NotFound => Err(AppError::SymbolNotFound(symbol.to_string())),
            FailureKind::RateLimited | FailureKind::Other => {
                stale_or(cache, symbol, || match kind {
                    FailureKind::RateLimited => AppError::RateLimited,
                    _ => AppError::QuoteUnavailable(symbol.to_string()),
                })
            }
        };
    }

    match provider.get_quote(symbol).await {
        Ok(quote) => {
            cache.store(&quote);
            Ok(ResolvedQuote {
                quote,
                stale: false,
            })
        }
        Err(QuoteError::NotFound) => {
            cache.record_failure(symbol, FailureKind::NotFound);
            Err(AppError::SymbolNotFound(symbol.to_string()))
        }
        Err(QuoteError::RateLimited) => {
            warn!("Quote provider rate limited on {}", symbol);
            cache.record_failure(symbol, FailureKind::RateLimited);
            stale_or(cache, symbol, || AppError::RateLimited)
        }
        Err(e) => {
            warn!("Quote fetch failed for {}: {}", symbol, e);
            cache.record_failure(symbol, FailureKind::Other);
            stale_or(cache, symbol, || AppError::QuoteUnavailable(symbol.to_string()))
        }
    }
}

/// Last-known quote marked stale, or the given error when nothing is cached.
fn stale_or(
    cache: &QuoteCache,
    symbol: &str,
    err: impl FnOnce() -> AppError,
) -> Result<ResolvedQuote, AppError> {
    match cache.last_known(symbol) {
        Some(cached) => Ok(ResolvedQuote {
            quote: cached.quote,
            stale: true,
        }),
        None => Err(err()),
    }
}

/// Price history straight from the provider. History is served fresh on
/// every call; only quotes get the cache treatment.
pub async fn get_history(
    provider: &dyn QuoteProvider,
    symbol: &str,
    interval: HistoryInterval,
    bars: u32,
) -> Result<Vec<PriceBar>, AppError> {
    let bars = bars.clamp(1, MAX_HISTORY_BARS);
    provider
        .get_history(symbol, interval, bars)
        .await
        .map_err(|e| {
            warn!(
                "History fetch ({}, {} bars) failed for {}: {}",
                interval.as_str(),
                bars,
                symbol,
                e
            );
            match e {
                QuoteError::NotFound => AppError::SymbolNotFound(symbol.to_string()),
                QuoteError::RateLimited => AppError::RateLimited,
                other => AppError::External(other.to_string()),
            }
        })
}
