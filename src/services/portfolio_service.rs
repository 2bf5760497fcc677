use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::engine::{self, PortfolioMetrics};
use crate::errors::AppError;
use crate::external::QuoteProvider;
use crate::services::quote_cache::QuoteCache;
use crate::services::quote_service;
use crate::store::AccountStore;

/// A valued snapshot of one account.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioView {
    pub account_id: Uuid,
    pub as_of: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: PortfolioMetrics,
    /// Holdings whose price refresh failed; they are valued at the last
    /// known price instead.
    pub stale_symbols: Vec<String>,
}

/// Values an account at current market prices.
///
/// All quotes are fetched concurrently and strictly outside the account
/// lock, then the freshly fetched prices are written back so later snapshots
/// start from them. A failed refresh falls back to the stored price and
/// flags the symbol instead of failing the whole view.
pub async fn view(
    store: &AccountStore,
    provider: &dyn QuoteProvider,
    cache: &QuoteCache,
    account_id: Uuid,
) -> Result<PortfolioView, AppError> {
    let account = store.get(account_id).ok_or(AppError::NotFound)?;

    let mut holdings = account.holdings.clone();
    let results = join_all(
        holdings
            .iter()
            .map(|h| quote_service::get_quote(provider, cache, &h.symbol)),
    )
    .await;

    let mut stale_symbols = Vec::new();
    let mut fresh_prices = Vec::new();
    for (holding, result) in holdings.iter_mut().zip(results) {
        match result {
            Ok(resolved) => {
                holding.current_price = resolved.quote.price;
                if resolved.stale {
                    stale_symbols.push(holding.symbol.clone());
                } else {
                    fresh_prices.push((holding.symbol.clone(), resolved.quote.price));
                }
            }
            Err(e) => {
                debug!(
                    "Price refresh failed for {}: {}, valuing at stored price",
                    holding.symbol, e
                );
                stale_symbols.push(holding.symbol.clone());
            }
        }
    }

    if !fresh_prices.is_empty() {
        store.update_prices(account_id, &fresh_prices);
    }

    Ok(PortfolioView {
        account_id,
        as_of: Utc::now(),
        metrics: engine::valuate(&holdings, account.cash),
        stale_symbols,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{QuoteError, SampleProvider};
    use crate::models::{HistoryInterval, Holding, PriceBar, Quote, SymbolMatch};
    use async_trait::async_trait;

    struct DownProvider;

    #[async_trait]
    impl QuoteProvider for DownProvider {
        async fn get_quote(&self, _symbol: &str) -> Result<Quote, QuoteError> {
            Err(QuoteError::Network("connection refused".into()))
        }
        async fn get_history(
            &self,
            _symbol: &str,
            _interval: HistoryInterval,
            _bars: u32,
        ) -> Result<Vec<PriceBar>, QuoteError> {
            Err(QuoteError::Network("connection refused".into()))
        }
        async fn search(&self, _keyword: &str) -> Result<Vec<SymbolMatch>, QuoteError> {
            Err(QuoteError::Network("connection refused".into()))
        }
    }

    fn store_with_holding() -> (AccountStore, Uuid) {
        let store = AccountStore::new(10_000.0);
        let account = store.open(1_000.0);
        store
            .with_state(account.id, |state| {
                state
                    .account
                    .holdings
                    .push(Holding::new("AAPL".into(), "Apple Inc.".into(), 10, 145.75));
            })
            .unwrap();
        (store, account.id)
    }

    #[tokio::test]
    async fn test_view_refreshes_prices_and_writes_back() {
        let (store, id) = store_with_holding();
        let provider = SampleProvider::fixed();
        let cache = QuoteCache::new();

        let view = view(&store, &provider, &cache, id).await.unwrap();

        assert!(view.stale_symbols.is_empty());
        let row = &view.metrics.holdings[0];
        assert_eq!(row.current_price, 178.85);
        assert_eq!(row.market_value, 1_788.5);
        assert_eq!(view.metrics.cash, 1_000.0);
        assert_eq!(view.metrics.account_value, 2_788.5);

        // the refreshed price is now the stored price
        let stored = store.get(id).unwrap();
        assert_eq!(stored.holding("AAPL").unwrap().current_price, 178.85);
    }

    #[tokio::test]
    async fn test_view_survives_a_dead_provider() {
        let (store, id) = store_with_holding();
        let cache = QuoteCache::new();

        let view = view(&store, &DownProvider, &cache, id).await.unwrap();

        assert_eq!(view.stale_symbols, vec!["AAPL".to_string()]);
        // valued at the stored price, which started at avg_price
        let row = &view.metrics.holdings[0];
        assert_eq!(row.current_price, 145.75);
        assert_eq!(row.gain_loss, 0.0);
    }

    #[tokio::test]
    async fn test_view_missing_account() {
        let store = AccountStore::new(10_000.0);
        let provider = SampleProvider::fixed();
        let cache = QuoteCache::new();

        let err = view(&store, &provider, &cache, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
