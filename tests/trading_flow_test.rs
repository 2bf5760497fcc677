/// Trading Flow Integration Tests
///
/// Drives the service layer the way the HTTP handlers do, against the
/// offline sample provider:
/// - Account lifecycle (open, trade, value, history, close)
/// - Competing concurrent orders against one cash balance
/// - Watchlist round trip
/// - Market overview endpoints backed by the sample table
use std::sync::Arc;

use papertrade::errors::AppError;
use papertrade::external::{QuoteProvider, SampleProvider};
use papertrade::models::{
    ActionFilter, HistoryParams, OpenAccountRequest, PlaceTradeRequest, TradeAction,
};
use papertrade::services::quote_cache::QuoteCache;
use papertrade::services::{
    account_service, history_service, market_service, portfolio_service, trade_service,
    watchlist_service,
};
use papertrade::store::AccountStore;

fn setup() -> (AccountStore, Arc<dyn QuoteProvider>, QuoteCache) {
    (
        AccountStore::new(10_000.0),
        Arc::new(SampleProvider::fixed()),
        QuoteCache::new(),
    )
}

fn market_order(symbol: &str, action: TradeAction, quantity: u32) -> PlaceTradeRequest {
    PlaceTradeRequest {
        symbol: symbol.to_string(),
        action,
        quantity,
        price: None,
    }
}

// ---------------------------------------------------------------------------
// Account lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_open_trade_value_close() {
    let (store, provider, cache) = setup();

    let account =
        account_service::open(&store, OpenAccountRequest { starting_cash: None }).unwrap();
    assert_eq!(account.cash, 10_000.0);

    // Market buy fills at the sample table price of 178.85
    let receipt = trade_service::place_trade(
        &store,
        provider.as_ref(),
        &cache,
        account.id,
        market_order("AAPL", TradeAction::Buy, 10),
    )
    .await
    .unwrap();
    assert_eq!(receipt.cash_after, 8_211.50);

    let view = portfolio_service::view(&store, provider.as_ref(), &cache, account.id)
        .await
        .unwrap();
    assert_eq!(view.metrics.account_value, 10_000.0);
    assert_eq!(view.metrics.holdings.len(), 1);
    assert!(view.stale_symbols.is_empty());

    // Sell everything back at the same price
    trade_service::place_trade(
        &store,
        provider.as_ref(),
        &cache,
        account.id,
        market_order("AAPL", TradeAction::Sell, 10),
    )
    .await
    .unwrap();
    assert_eq!(store.get(account.id).unwrap().cash, 10_000.0);

    let page = history_service::history(&store, account.id, HistoryParams::default()).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.entries[0].action, TradeAction::Sell);
    assert_eq!(page.entries[1].action, TradeAction::Buy);

    account_service::close(&store, account.id).unwrap();
    assert!(matches!(
        account_service::get(&store, account.id).unwrap_err(),
        AppError::NotFound
    ));
}

#[tokio::test]
async fn test_rejected_order_is_never_ledgered() {
    let (store, provider, cache) = setup();
    let account = store.open(100.0);

    let err = trade_service::place_trade(
        &store,
        provider.as_ref(),
        &cache,
        account.id,
        market_order("NVDA", TradeAction::Buy, 1),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds { .. }));

    assert_eq!(store.get(account.id).unwrap().cash, 100.0);
    assert!(store.ledger(account.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_demo_account_is_tradeable() {
    let (store, provider, cache) = setup();
    let demo = account_service::seed_demo(&store);

    // Sell off the seeded TSLA position entirely
    let receipt = trade_service::place_trade(
        &store,
        provider.as_ref(),
        &cache,
        demo.id,
        market_order("TSLA", TradeAction::Sell, 8),
    )
    .await
    .unwrap();
    assert_eq!(receipt.entry.price_per_share, 195.70);
    // bought at 210.30, sold at 195.70
    assert!(receipt.realized_gain_loss.unwrap() < 0.0);
    assert!(store.get(demo.id).unwrap().holding("TSLA").is_none());

    // the seeded ledger plus the sell just placed, filterable by action
    let sells = history_service::history(
        &store,
        demo.id,
        HistoryParams {
            action: ActionFilter::Sell,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(sells.total, 2);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_competing_orders_cannot_overspend() {
    let (store, provider, cache) = setup();
    // Enough cash for one 5-share fill at 178.85, nowhere near two
    let account = store.open(1_000.0);

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let store = store.clone();
        let provider = Arc::clone(&provider);
        let cache = cache.clone();
        let id = account.id;
        tasks.push(tokio::spawn(async move {
            trade_service::place_trade(
                &store,
                provider.as_ref(),
                &cache,
                id,
                market_order("AAPL", TradeAction::Buy, 5),
            )
            .await
        }));
    }

    let mut fills = 0;
    let mut rejections = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => fills += 1,
            Err(AppError::InsufficientFunds { .. }) => rejections += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(fills, 1);
    assert_eq!(rejections, 1);

    let account = store.get(account.id).unwrap();
    assert_eq!(account.shares_held("AAPL"), 5);
    assert_eq!(account.cash, 1_000.0 - 5.0 * 178.85);
    assert_eq!(store.ledger(account.id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_parallel_sells_never_exceed_the_position() {
    let (store, provider, cache) = setup();
    let account = store.open(10_000.0);
    trade_service::place_trade(
        &store,
        provider.as_ref(),
        &cache,
        account.id,
        market_order("WMT", TradeAction::Buy, 10),
    )
    .await
    .unwrap();

    // Four tasks each try to dump 4 shares; only ten exist
    let mut tasks = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        let provider = Arc::clone(&provider);
        let cache = cache.clone();
        let id = account.id;
        tasks.push(tokio::spawn(async move {
            trade_service::place_trade(
                &store,
                provider.as_ref(),
                &cache,
                id,
                market_order("WMT", TradeAction::Sell, 4),
            )
            .await
        }));
    }

    let mut sold = 0u32;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            sold += 4;
        }
    }
    assert_eq!(sold, 8, "exactly two of the four sells fit the position");
    assert_eq!(store.get(account.id).unwrap().shares_held("WMT"), 2);
}

// ---------------------------------------------------------------------------
// Watchlist
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_watchlist_round_trip() {
    let (store, provider, cache) = setup();
    let account = store.open(10_000.0);

    let list = watchlist_service::add(&store, account.id, " jpm ").unwrap();
    assert_eq!(list, vec!["JPM"]);

    let rows = watchlist_service::list(&store, provider.as_ref(), &cache, account.id)
        .await
        .unwrap();
    let jpm = rows.iter().find(|r| r.symbol == "JPM").unwrap();
    assert_eq!(jpm.price, Some(198.44));
    assert!(!jpm.stale);

    let list = watchlist_service::remove(&store, account.id, "JPM").unwrap();
    assert!(list.is_empty());
    assert!(matches!(
        watchlist_service::remove(&store, account.id, "JPM").unwrap_err(),
        AppError::NotFound
    ));
}

// ---------------------------------------------------------------------------
// Market overview
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_movers_and_indices_from_sample_data() {
    let (_, provider, cache) = setup();

    let gainers = market_service::top_gainers(provider.as_ref(), &cache).await;
    assert!(!gainers.is_empty());
    // NVDA's +3.25% leads the sample table
    assert_eq!(gainers[0].symbol, "NVDA");
    assert!(gainers.windows(2).all(|p| p[0].change_percent >= p[1].change_percent));

    let losers = market_service::top_losers(provider.as_ref(), &cache).await;
    assert!(losers.iter().all(|q| q.change_percent < 0.0));

    let indices = market_service::indices(provider.as_ref(), &cache).await;
    assert_eq!(indices.sp500.symbol, "SPY");
    assert_eq!(indices.sp500.price, 5_304.12);
    assert_eq!(indices.dow_jones.symbol, "DIA");
    assert_eq!(indices.nasdaq.symbol, "QQQ");
}

#[tokio::test]
async fn test_symbol_search_through_the_service() {
    let (_, provider, _) = setup();

    let matches = market_service::search(provider.as_ref(), "apple")
        .await
        .unwrap();
    assert!(matches.iter().any(|m| m.symbol == "AAPL"));

    let err = market_service::search(provider.as_ref(), "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
