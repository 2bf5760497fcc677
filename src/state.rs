use std::sync::Arc;

use crate::external::QuoteProvider;
use crate::services::quote_cache::QuoteCache;
use crate::store::AccountStore;

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountStore,
    pub quotes: Arc<dyn QuoteProvider>,
    pub quote_cache: QuoteCache,
}

impl AppState {
    pub fn new(accounts: AccountStore, quotes: Arc<dyn QuoteProvider>) -> Self {
        Self {
            accounts,
            quotes,
            quote_cache: QuoteCache::new(),
        }
    }
}
