use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// A point-in-time market quote, already normalized across providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    /// Absolute change versus the previous close.
    pub change: f64,
    /// Percentage change versus the previous close.
    pub change_percent: f64,
    pub latest_trading_day: Option<NaiveDate>,
}

/// One OHLCV bar of price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryInterval {
    Daily,
    Weekly,
    Monthly,
}

impl HistoryInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryInterval::Daily => "daily",
            HistoryInterval::Weekly => "weekly",
            HistoryInterval::Monthly => "monthly",
        }
    }
}

impl Default for HistoryInterval {
    fn default() -> Self {
        HistoryInterval::Daily
    }
}

/// Query string for the price history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceHistoryParams {
    #[serde(default)]
    pub interval: HistoryInterval,
    /// Number of bars to return, newest last.
    #[serde(default = "default_history_days")]
    pub days: u32,
}

fn default_history_days() -> u32 {
    30
}

impl Default for PriceHistoryParams {
    fn default() -> Self {
        Self {
            interval: HistoryInterval::Daily,
            days: default_history_days(),
        }
    }
}

/// One result row from a symbol search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    /// Provider relevance score in `0.0..=1.0`, when the provider reports one.
    pub match_score: Option<f64>,
}

// A watchlist row as served to clients. Price fields are `None` when no
// live, cached, or sample data exists for the symbol.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistQuote {
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    /// Set when the row was served from a cached quote after a failed refresh.
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexQuote {
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
}

/// Snapshot of the three headline index trackers.
#[derive(Debug, Clone, Serialize)]
pub struct MarketIndices {
    pub sp500: IndexQuote,
    pub dow_jones: IndexQuote,
    pub nasdaq: IndexQuote,
}
