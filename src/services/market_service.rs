use futures::future::join_all;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;
use tracing::warn;

use crate::errors::AppError;
use crate::external::{sample_quote, QuoteError, QuoteProvider};
use crate::models::{IndexQuote, MarketIndices, Quote, SymbolMatch};
use crate::services::quote_cache::QuoteCache;
use crate::services::quote_service;

/// The fixed universe shown on the market overview page.
pub const MOVER_SYMBOLS: [&str; 10] = [
    "AAPL", "MSFT", "AMZN", "GOOGL", "META", "TSLA", "NVDA", "JPM", "V", "WMT",
];

/// How many rows the gainer and loser boards show.
pub const TOP_MOVER_COUNT: usize = 5;

const SP500_TRACKER: &str = "SPY";
const DOW_TRACKER: &str = "DIA";
const NASDAQ_TRACKER: &str = "QQQ";

/// Uppercases and validates a user-supplied symbol: one leading letter, then
/// up to nine letters, digits, dots or dashes.
pub fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    static SYMBOL_RE: OnceLock<Regex> = OnceLock::new();
    let re = SYMBOL_RE.get_or_init(|| {
        Regex::new(r"^[A-Z][A-Z0-9.\-]{0,9}$").expect("symbol pattern is valid")
    });

    let candidate = raw.trim().to_uppercase();
    if re.is_match(&candidate) {
        Ok(candidate)
    } else {
        Err(AppError::Validation(format!("Invalid symbol '{}'", raw.trim())))
    }
}

/// Quotes for the overview universe, biggest absolute movers first. Never
/// fails: when every fetch comes back empty the sample rows stand in.
pub async fn movers(provider: &dyn QuoteProvider, cache: &QuoteCache) -> Vec<Quote> {
    let fetched = join_all(
        MOVER_SYMBOLS
            .iter()
            .map(|symbol| quote_service::get_quote(provider, cache, symbol)),
    )
    .await;

    let mut quotes: Vec<Quote> = fetched
        .into_iter()
        .filter_map(|result| result.ok().map(|resolved| resolved.quote))
        .collect();

    if quotes.is_empty() {
        warn!("No mover quotes available, serving sample rows");
        quotes = MOVER_SYMBOLS.iter().filter_map(|s| sample_quote(s)).collect();
    }

    quotes.sort_by(|a, b| {
        b.change_percent
            .abs()
            .partial_cmp(&a.change_percent.abs())
            .unwrap_or(Ordering::Equal)
    });
    quotes
}

pub async fn top_gainers(provider: &dyn QuoteProvider, cache: &QuoteCache) -> Vec<Quote> {
    let mut gainers: Vec<Quote> = movers(provider, cache)
        .await
        .into_iter()
        .filter(|q| q.change_percent > 0.0)
        .collect();
    gainers.sort_by(|a, b| {
        b.change_percent
            .partial_cmp(&a.change_percent)
            .unwrap_or(Ordering::Equal)
    });
    gainers.truncate(TOP_MOVER_COUNT);
    gainers
}

pub async fn top_losers(provider: &dyn QuoteProvider, cache: &QuoteCache) -> Vec<Quote> {
    let mut losers: Vec<Quote> = movers(provider, cache)
        .await
        .into_iter()
        .filter(|q| q.change_percent < 0.0)
        .collect();
    losers.sort_by(|a, b| {
        a.change_percent
            .partial_cmp(&b.change_percent)
            .unwrap_or(Ordering::Equal)
    });
    losers.truncate(TOP_MOVER_COUNT);
    losers
}

/// The three headline indices via their ETF trackers, each falling back to
/// its sample value independently.
pub async fn indices(provider: &dyn QuoteProvider, cache: &QuoteCache) -> MarketIndices {
    let (sp500, dow_jones, nasdaq) = tokio::join!(
        index_quote(provider, cache, SP500_TRACKER),
        index_quote(provider, cache, DOW_TRACKER),
        index_quote(provider, cache, NASDAQ_TRACKER),
    );
    MarketIndices {
        sp500,
        dow_jones,
        nasdaq,
    }
}

async fn index_quote(
    provider: &dyn QuoteProvider,
    cache: &QuoteCache,
    symbol: &str,
) -> IndexQuote {
    match quote_service::get_quote(provider, cache, symbol).await {
        Ok(resolved) => IndexQuote {
            symbol: symbol.to_string(),
            price: resolved.quote.price,
            change_percent: resolved.quote.change_percent,
        },
        Err(e) => {
            warn!("Index tracker {} unavailable: {}, serving sample value", symbol, e);
            sample_quote(symbol)
                .map(|q| IndexQuote {
                    symbol: q.symbol,
                    price: q.price,
                    change_percent: q.change_percent,
                })
                .unwrap_or(IndexQuote {
                    symbol: symbol.to_string(),
                    price: 0.0,
                    change_percent: 0.0,
                })
        }
    }
}

pub async fn search(
    provider: &dyn QuoteProvider,
    keyword: &str,
) -> Result<Vec<SymbolMatch>, AppError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::Validation("Search keyword cannot be empty".into()));
    }

    provider.search(keyword).await.map_err(|e| {
        warn!("Symbol search failed for '{}': {}", keyword, e);
        match e {
            QuoteError::RateLimited => AppError::RateLimited,
            other => AppError::External(other.to_string()),
        }
    })
}
