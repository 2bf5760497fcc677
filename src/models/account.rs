use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Holding;

// A simulated brokerage account: a cash balance plus the holdings bought with
// it. Holdings keep insertion order, which is also the display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub cash: f64,
    pub holdings: Vec<Holding>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(cash: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            cash,
            holdings: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.symbol == symbol)
    }

    /// Shares currently held in `symbol`, zero if the account has no position.
    pub fn shares_held(&self, symbol: &str) -> u32 {
        self.holding(symbol).map(|h| h.shares).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAccountRequest {
    /// Cash the account starts with. Falls back to the server default when omitted.
    pub starting_cash: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub cash: f64,
    pub holding_count: usize,
    pub created_at: DateTime<Utc>,
}

impl AccountSummary {
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.id,
            cash: account.cash,
            holding_count: account.holdings.len(),
            created_at: account.created_at,
        }
    }
}
