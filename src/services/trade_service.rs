use tracing::{info, warn};
use uuid::Uuid;

use crate::engine;
use crate::errors::AppError;
use crate::external::QuoteProvider;
use crate::models::{PlaceTradeRequest, TradeReceipt, TradeRequest};
use crate::services::market_service;
use crate::services::quote_cache::QuoteCache;
use crate::services::quote_service;
use crate::store::AccountStore;

/// Executes an order against an account.
///
/// Price and company name are resolved up front, before the account lock is
/// taken: quote fetches are slow I/O and must never extend the critical
/// section. Everything that touches the account itself (validate, apply,
/// append to the ledger) happens as one atomic step under the lock.
pub async fn place_trade(
    store: &AccountStore,
    provider: &dyn QuoteProvider,
    cache: &QuoteCache,
    account_id: Uuid,
    input: PlaceTradeRequest,
) -> Result<TradeReceipt, AppError> {
    let symbol = market_service::normalize_symbol(&input.symbol)?;

    let (price, name) = match input.price {
        Some(price) => {
            if !price.is_finite() || price <= 0.0 {
                return Err(AppError::Validation(format!(
                    "invalid price {price}: must be a positive amount"
                )));
            }
            let name = resolve_name(store, provider, cache, account_id, &symbol).await?;
            (price, name)
        }
        None => {
            let resolved = quote_service::get_quote(provider, cache, &symbol).await?;
            if resolved.stale {
                warn!(
                    "Executing {} at stale quote {:.2}",
                    symbol, resolved.quote.price
                );
            }
            (resolved.quote.price, resolved.quote.name)
        }
    };

    let request = TradeRequest {
        symbol: symbol.clone(),
        action: input.action,
        quantity: input.quantity,
        price_per_share: price,
    };

    let receipt = store
        .with_state(account_id, |state| -> Result<TradeReceipt, AppError> {
            let execution = engine::execute(&request, &name, &mut state.account)?;
            state.ledger.push(execution.entry.clone());
            Ok(TradeReceipt {
                entry: execution.entry,
                cash_after: state.account.cash,
                realized_gain_loss: execution.realized_gain_loss,
            })
        })
        .ok_or(AppError::NotFound)??;

    info!(
        "✓ {} {} x{} @ {:.2} on account {}, cash now {:.2}",
        request.action.as_str(),
        request.symbol,
        request.quantity,
        request.price_per_share,
        account_id,
        receipt.cash_after
    );
    Ok(receipt)
}

/// Display name for the ledger entry: the held position's name when there is
/// one, otherwise whatever the quote says, otherwise the symbol itself.
async fn resolve_name(
    store: &AccountStore,
    provider: &dyn QuoteProvider,
    cache: &QuoteCache,
    account_id: Uuid,
    symbol: &str,
) -> Result<String, AppError> {
    let account = store.get(account_id).ok_or(AppError::NotFound)?;
    if let Some(holding) = account.holding(symbol) {
        return Ok(holding.name.clone());
    }
    match quote_service::get_quote(provider, cache, symbol).await {
        Ok(resolved) => Ok(resolved.quote.name),
        Err(AppError::SymbolNotFound(s)) => Err(AppError::SymbolNotFound(s)),
        Err(_) => Ok(symbol.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::SampleProvider;
    use crate::models::TradeAction;

    fn setup() -> (AccountStore, SampleProvider, QuoteCache, Uuid) {
        let store = AccountStore::new(10_000.0);
        let account = store.open(10_000.0);
        (store, SampleProvider::fixed(), QuoteCache::new(), account.id)
    }

    fn buy(symbol: &str, quantity: u32, price: Option<f64>) -> PlaceTradeRequest {
        PlaceTradeRequest {
            symbol: symbol.to_string(),
            action: TradeAction::Buy,
            quantity,
            price,
        }
    }

    #[tokio::test]
    async fn test_market_buy_executes_at_quoted_price() {
        let (store, provider, cache, id) = setup();

        let receipt = place_trade(&store, &provider, &cache, id, buy("AAPL", 10, None))
            .await
            .unwrap();

        assert_eq!(receipt.entry.price_per_share, 178.85);
        assert_eq!(receipt.entry.name, "Apple Inc.");
        assert_eq!(receipt.cash_after, 8_211.50);

        let account = store.get(id).unwrap();
        assert_eq!(account.shares_held("AAPL"), 10);
    }

    #[tokio::test]
    async fn test_price_override_skips_quote() {
        let (store, provider, cache, id) = setup();

        let receipt = place_trade(&store, &provider, &cache, id, buy("AAPL", 10, Some(150.0)))
            .await
            .unwrap();

        assert_eq!(receipt.entry.price_per_share, 150.0);
        assert_eq!(receipt.cash_after, 8_500.0);
    }

    #[tokio::test]
    async fn test_symbol_is_normalized_before_execution() {
        let (store, provider, cache, id) = setup();

        let receipt = place_trade(&store, &provider, &cache, id, buy(" aapl ", 1, None))
            .await
            .unwrap();
        assert_eq!(receipt.entry.symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_rejection_leaves_account_untouched() {
        let (store, provider, cache, id) = setup();

        let err = place_trade(&store, &provider, &cache, id, buy("NVDA", 100, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientFunds { .. }));

        let account = store.get(id).unwrap();
        assert_eq!(account.cash, 10_000.0);
        assert!(account.holdings.is_empty());
        assert!(store.ledger(id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sell_records_realized_gain() {
        let (store, provider, cache, id) = setup();
        place_trade(&store, &provider, &cache, id, buy("AAPL", 10, Some(150.0)))
            .await
            .unwrap();

        let receipt = place_trade(
            &store,
            &provider,
            &cache,
            id,
            PlaceTradeRequest {
                symbol: "AAPL".into(),
                action: TradeAction::Sell,
                quantity: 10,
                price: Some(178.85),
            },
        )
        .await
        .unwrap();

        let realized = receipt.realized_gain_loss.unwrap();
        assert!((realized - 10.0 * (178.85 - 150.0)).abs() < 1e-9);
        assert!(store.get(id).unwrap().holdings.is_empty());
        assert_eq!(store.ledger(id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_symbol_never_trades() {
        let (store, provider, cache, id) = setup();

        let err = place_trade(&store, &provider, &cache, id, buy("ZZZZ", 1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SymbolNotFound(_)));
        assert!(store.ledger(id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let (store, provider, cache, _) = setup();

        let err = place_trade(&store, &provider, &cache, Uuid::new_v4(), buy("AAPL", 1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
