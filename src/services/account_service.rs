use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Account, AccountSummary, Holding, LedgerEntry, OpenAccountRequest, TradeAction};
use crate::store::{AccountState, AccountStore};

pub fn open(store: &AccountStore, input: OpenAccountRequest) -> Result<Account, AppError> {
    let cash = input
        .starting_cash
        .unwrap_or_else(|| store.default_starting_cash());
    if !cash.is_finite() || cash < 0.0 {
        return Err(AppError::Validation(
            "Starting cash must be a non-negative amount".into(),
        ));
    }

    let account = store.open(cash);
    info!("🚀 Opened account {} with {:.2} starting cash", account.id, cash);
    Ok(account)
}

pub fn list(store: &AccountStore) -> Vec<AccountSummary> {
    store.summaries()
}

pub fn get(store: &AccountStore, id: Uuid) -> Result<Account, AppError> {
    store.get(id).ok_or(AppError::NotFound)
}

pub fn close(store: &AccountStore, id: Uuid) -> Result<(), AppError> {
    if store.close(id) {
        info!("Closed account {}", id);
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

/// Seeds an account with a few positions, backdated trades and a starter
/// watchlist, so a fresh install has something to look at.
pub fn seed_demo(store: &AccountStore) -> Account {
    let mut state = AccountState::new(store.default_starting_cash());

    let positions: [(&str, &str, u32, f64, f64); 3] = [
        ("AAPL", "Apple Inc.", 10, 145.75, 178.85),
        ("MSFT", "Microsoft Corporation", 5, 320.45, 412.31),
        ("TSLA", "Tesla, Inc.", 8, 210.30, 195.70),
    ];
    for (symbol, name, shares, avg, current) in positions {
        let mut holding = Holding::new(symbol.into(), name.into(), shares, avg);
        holding.current_price = current;
        state.account.holdings.push(holding);
    }

    // oldest first, matching append order
    let trades: [(&str, &str, TradeAction, u32, f64, i64); 3] = [
        ("TSLA", "Tesla, Inc.", TradeAction::Buy, 8, 210.30, 8),
        ("MSFT", "Microsoft Corporation", TradeAction::Sell, 2, 410.22, 4),
        ("AAPL", "Apple Inc.", TradeAction::Buy, 5, 178.85, 2),
    ];
    for (symbol, name, action, quantity, price, days_ago) in trades {
        let mut entry = LedgerEntry::new(symbol.into(), name.into(), action, quantity, price);
        entry.executed_at = Utc::now() - Duration::days(days_ago);
        state.ledger.push(entry);
    }

    state.watchlist = ["NVDA", "AMD", "INTC"].iter().map(|s| s.to_string()).collect();

    let account = store.insert(state);
    info!("🎯 Seeded demo account {}", account.id);
    account
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_uses_store_default_cash() {
        let store = AccountStore::new(10_000.0);
        let account = open(&store, OpenAccountRequest { starting_cash: None }).unwrap();
        assert_eq!(account.cash, 10_000.0);
    }

    #[test]
    fn test_open_with_explicit_cash() {
        let store = AccountStore::new(10_000.0);
        let account = open(
            &store,
            OpenAccountRequest {
                starting_cash: Some(25_000.0),
            },
        )
        .unwrap();
        assert_eq!(account.cash, 25_000.0);
    }

    #[test]
    fn test_open_rejects_negative_cash() {
        let store = AccountStore::new(10_000.0);
        let err = open(
            &store,
            OpenAccountRequest {
                starting_cash: Some(-1.0),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_close_missing_account() {
        let store = AccountStore::new(10_000.0);
        assert!(matches!(
            close(&store, Uuid::new_v4()).unwrap_err(),
            AppError::NotFound
        ));
    }

    #[test]
    fn test_demo_account_shape() {
        let store = AccountStore::new(10_000.0);
        let account = seed_demo(&store);

        assert_eq!(account.cash, 10_000.0);
        assert_eq!(account.holdings.len(), 3);
        assert_eq!(account.shares_held("AAPL"), 10);
        assert_eq!(account.holding("MSFT").unwrap().avg_price, 320.45);

        let ledger = store.ledger(account.id).unwrap();
        assert_eq!(ledger.len(), 3);
        // chronological append order, oldest first
        assert!(ledger[0].executed_at < ledger[1].executed_at);
        assert!(ledger[1].executed_at < ledger[2].executed_at);
        assert_eq!(ledger[1].action, TradeAction::Sell);

        let watchlist = store.watchlist(account.id).unwrap();
        assert_eq!(watchlist, vec!["NVDA", "AMD", "INTC"]);
    }
}
