use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TradeAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Completed,
    Pending,
    Failed,
}

// One executed trade, recorded at execution time and never modified afterwards.
// The ledger is the append-only audit trail of the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub executed_at: DateTime<Utc>,
    pub symbol: String,
    pub name: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub price_per_share: f64,
    pub status: TradeStatus,
}

impl LedgerEntry {
    pub fn new(
        symbol: String,
        name: String,
        action: TradeAction,
        quantity: u32,
        price_per_share: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            executed_at: Utc::now(),
            symbol,
            name,
            action,
            quantity,
            price_per_share,
            status: TradeStatus::Completed,
        }
    }

    /// Gross value of the trade (`quantity * price_per_share`).
    pub fn total(&self) -> f64 {
        self.quantity as f64 * self.price_per_share
    }
}

// ---------------------------------------------------------------------------
// History query types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionFilter {
    All,
    Buy,
    Sell,
}

impl ActionFilter {
    pub fn matches(&self, action: TradeAction) -> bool {
        match self {
            ActionFilter::All => true,
            ActionFilter::Buy => action == TradeAction::Buy,
            ActionFilter::Sell => action == TradeAction::Sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum RangeFilter {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl RangeFilter {
    /// Earliest `executed_at` admitted by the filter, `None` for `All`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            RangeFilter::All => return None,
            RangeFilter::Day => 1,
            RangeFilter::Week => 7,
            RangeFilter::Month => 30,
            RangeFilter::Quarter => 90,
        };
        Some(now - Duration::days(days))
    }
}

/// Query string for the trade history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "ActionFilter::default")]
    pub action: ActionFilter,
    #[serde(default = "RangeFilter::default")]
    pub range: RangeFilter,
    /// Exact-match symbol filter, case-insensitive.
    pub symbol: Option<String>,
    /// 1-based page index.
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ActionFilter {
    fn default() -> Self {
        ActionFilter::All
    }
}

impl Default for RangeFilter {
    fn default() -> Self {
        RangeFilter::All
    }
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

impl Default for HistoryParams {
    fn default() -> Self {
        Self {
            action: ActionFilter::All,
            range: RangeFilter::All,
            symbol: None,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

/// One page of ledger entries, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub entries: Vec<LedgerEntry>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}
