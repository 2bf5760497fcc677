use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Account, AccountSummary, LedgerEntry};

/// Everything owned by one account, guarded together: the balances and
/// holdings, the trade ledger, and the watchlist.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub account: Account,
    pub ledger: Vec<LedgerEntry>,
    pub watchlist: Vec<String>,
}

impl AccountState {
    pub fn new(cash: f64) -> Self {
        Self {
            account: Account::new(cash),
            ledger: Vec::new(),
            watchlist: Vec::new(),
        }
    }
}

/// In-memory account registry.
///
/// Each account sits behind its own mutex, so work on different accounts
/// never contends. [`with_state`](Self::with_state) is the only way to
/// mutate: whatever runs inside the closure is one atomic step from the
/// point of view of every other caller. Quote fetches are I/O and must
/// finish before entering it.
#[derive(Clone)]
pub struct AccountStore {
    accounts: Arc<DashMap<Uuid, Arc<Mutex<AccountState>>>>,
    default_starting_cash: f64,
}

impl AccountStore {
    pub fn new(default_starting_cash: f64) -> Self {
        Self {
            accounts: Arc::new(DashMap::new()),
            default_starting_cash,
        }
    }

    pub fn default_starting_cash(&self) -> f64 {
        self.default_starting_cash
    }

    /// Opens a new account and returns a snapshot of it.
    pub fn open(&self, cash: f64) -> Account {
        self.insert(AccountState::new(cash))
    }

    /// Registers a pre-built state (used for the seeded demo account).
    pub fn insert(&self, state: AccountState) -> Account {
        let account = state.account.clone();
        self.accounts
            .insert(account.id, Arc::new(Mutex::new(state)));
        account
    }

    /// Point-in-time snapshot of an account. Consistent, since the clone
    /// happens under the account's lock.
    pub fn get(&self, id: Uuid) -> Option<Account> {
        let entry = self.accounts.get(&id)?.clone();
        let state = entry.lock();
        Some(state.account.clone())
    }

    pub fn summaries(&self) -> Vec<AccountSummary> {
        let mut out: Vec<AccountSummary> = self
            .accounts
            .iter()
            .map(|entry| {
                let state = entry.value().lock();
                AccountSummary::from_account(&state.account)
            })
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub fn close(&self, id: Uuid) -> bool {
        self.accounts.remove(&id).is_some()
    }

    /// Runs `f` with exclusive access to the account. Validate-then-execute
    /// sequences belong in here so no other trade can interleave.
    pub fn with_state<T>(&self, id: Uuid, f: impl FnOnce(&mut AccountState) -> T) -> Option<T> {
        let entry = self.accounts.get(&id)?.clone();
        let mut state = entry.lock();
        Some(f(&mut state))
    }

    pub fn ledger(&self, id: Uuid) -> Option<Vec<LedgerEntry>> {
        self.with_state(id, |state| state.ledger.clone())
    }

    pub fn watchlist(&self, id: Uuid) -> Option<Vec<String>> {
        self.with_state(id, |state| state.watchlist.clone())
    }

    /// Writes freshly fetched prices back into the stored holdings. Symbols
    /// sold while the fetch was in flight are skipped silently.
    pub fn update_prices(&self, id: Uuid, prices: &[(String, f64)]) -> bool {
        self.with_state(id, |state| {
            for (symbol, price) in prices {
                if let Some(holding) = state
                    .account
                    .holdings
                    .iter_mut()
                    .find(|h| &h.symbol == symbol)
                {
                    holding.current_price = *price;
                }
            }
        })
        .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Holding;

    #[test]
    fn test_open_get_close() {
        let store = AccountStore::new(10_000.0);
        let account = store.open(5_000.0);

        let fetched = store.get(account.id).unwrap();
        assert_eq!(fetched.cash, 5_000.0);
        assert_eq!(fetched.id, account.id);

        assert!(store.close(account.id));
        assert!(store.get(account.id).is_none());
        assert!(!store.close(account.id));
    }

    #[test]
    fn test_new_account_starts_with_an_empty_watchlist() {
        let store = AccountStore::new(10_000.0);
        let account = store.open(10_000.0);

        assert!(store.watchlist(account.id).unwrap().is_empty());
        assert!(store.ledger(account.id).unwrap().is_empty());
    }

    #[test]
    fn test_with_state_mutations_are_visible() {
        let store = AccountStore::new(10_000.0);
        let account = store.open(1_000.0);

        store
            .with_state(account.id, |state| {
                state.account.cash -= 250.0;
            })
            .unwrap();

        assert_eq!(store.get(account.id).unwrap().cash, 750.0);
    }

    #[test]
    fn test_with_state_missing_account() {
        let store = AccountStore::new(10_000.0);
        assert!(store.with_state(Uuid::new_v4(), |_| ()).is_none());
    }

    #[test]
    fn test_update_prices_skips_sold_symbols() {
        let store = AccountStore::new(10_000.0);
        let account = store.open(0.0);
        store
            .with_state(account.id, |state| {
                state
                    .account
                    .holdings
                    .push(Holding::new("AAPL".into(), "Apple Inc.".into(), 10, 150.0));
            })
            .unwrap();

        // MSFT is not held, so only AAPL gets the new price
        store.update_prices(
            account.id,
            &[("AAPL".to_string(), 180.0), ("MSFT".to_string(), 400.0)],
        );

        let fetched = store.get(account.id).unwrap();
        assert_eq!(fetched.holding("AAPL").unwrap().current_price, 180.0);
        assert!(fetched.holding("MSFT").is_none());
    }

    #[test]
    fn test_summaries_newest_first() {
        let store = AccountStore::new(10_000.0);
        let first = store.open(1.0);
        let second = store.open(2.0);

        let summaries = store.summaries();
        assert_eq!(summaries.len(), 2);
        // created_at ties are possible in a fast loop; only assert the set
        let ids: Vec<Uuid> = summaries.iter().map(|s| s.id).collect();
        assert!(ids.contains(&first.id));
        assert!(ids.contains(&second.id));
        assert!(summaries[0].created_at >= summaries[1].created_at);
    }
}
