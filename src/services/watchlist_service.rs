use futures::future::join_all;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::external::{sample_quote, QuoteProvider};
use crate::models::WatchlistQuote;
use crate::services::market_service;
use crate::services::quote_cache::QuoteCache;
use crate::services::quote_service;
use crate::store::AccountStore;

/// The account's watchlist with a quote per row.
///
/// Rows degrade independently: a live quote, then the sample table, then a
/// placeholder with no price at all. The view itself never fails over market
/// data.
pub async fn list(
    store: &AccountStore,
    provider: &dyn QuoteProvider,
    cache: &QuoteCache,
    account_id: Uuid,
) -> Result<Vec<WatchlistQuote>, AppError> {
    let symbols = store.watchlist(account_id).ok_or(AppError::NotFound)?;

    let fetched = join_all(
        symbols
            .iter()
            .map(|symbol| quote_service::get_quote(provider, cache, symbol)),
    )
    .await;

    let rows = symbols
        .into_iter()
        .zip(fetched)
        .map(|(symbol, result)| match result {
            Ok(resolved) => WatchlistQuote {
                symbol: resolved.quote.symbol,
                name: resolved.quote.name,
                price: Some(resolved.quote.price),
                change_percent: Some(resolved.quote.change_percent),
                stale: resolved.stale,
            },
            Err(e) => {
                debug!("Watchlist quote failed for {}: {}", symbol, e);
                match sample_quote(&symbol) {
                    Some(sample) => WatchlistQuote {
                        symbol: sample.symbol,
                        name: sample.name,
                        price: Some(sample.price),
                        change_percent: Some(sample.change_percent),
                        stale: true,
                    },
                    None => WatchlistQuote {
                        name: symbol.clone(),
                        symbol,
                        price: None,
                        change_percent: None,
                        stale: true,
                    },
                }
            }
        })
        .collect();
    Ok(rows)
}

/// Adds a symbol to the watchlist. Adding a symbol that is already on the
/// list is a no-op. Returns the updated list.
pub fn add(store: &AccountStore, account_id: Uuid, raw_symbol: &str) -> Result<Vec<String>, AppError> {
    let symbol = market_service::normalize_symbol(raw_symbol)?;
    store
        .with_state(account_id, |state| {
            if !state.watchlist.contains(&symbol) {
                state.watchlist.push(symbol.clone());
            }
            state.watchlist.clone()
        })
        .ok_or(AppError::NotFound)
}

/// Removes a symbol from the watchlist. Returns the updated list, or
/// not-found when the symbol was not on it.
pub fn remove(
    store: &AccountStore,
    account_id: Uuid,
    raw_symbol: &str,
) -> Result<Vec<String>, AppError> {
    let symbol = market_service::normalize_symbol(raw_symbol)?;
    store
        .with_state(account_id, |state| {
            let before = state.watchlist.len();
            state.watchlist.retain(|s| s != &symbol);
            if state.watchlist.len() == before {
                Err(AppError::NotFound)
            } else {
                Ok(state.watchlist.clone())
            }
        })
        .ok_or(AppError::NotFound)?
}
