use serde::{Deserialize, Serialize};

use super::LedgerEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

// A fully priced order, ready for validation and execution. The price is
// always resolved (from a live quote or a caller override) before the order
// reaches the engine.
#[derive(Debug, Clone)]
pub struct TradeRequest {
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub price_per_share: f64,
}

/// POST body for the trade endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceTradeRequest {
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: u32,
    /// Optional limit-style override. When omitted the order executes at the
    /// current quoted price.
    pub price: Option<f64>,
}

/// What the trade endpoint returns once an order has been executed.
#[derive(Debug, Clone, Serialize)]
pub struct TradeReceipt {
    pub entry: LedgerEntry,
    pub cash_after: f64,
    /// Realized profit or loss against the average cost, sells only.
    pub realized_gain_loss: Option<f64>,
}
