use serde::Serialize;

use crate::models::Holding;

/// Per-holding figures derived from the stored position and its latest price.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingMetrics {
    pub symbol: String,
    pub name: String,
    pub shares: u32,
    pub avg_price: f64,
    pub current_price: f64,
    pub cost_basis: f64,
    pub market_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
    /// Share of the invested portfolio value, in percent.
    pub allocation_percent: f64,
}

/// Aggregate figures for an account, derived in one pass from its holdings.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioMetrics {
    pub holdings: Vec<HoldingMetrics>,
    /// Market value of everything invested, excluding cash.
    pub portfolio_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub cash: f64,
    /// `portfolio_value + cash`.
    pub account_value: f64,
    pub invested_percent: f64,
    pub cash_percent: f64,
}

/// Values a set of holdings against their current prices.
///
/// Percentages guard against division by zero: a zero cost basis reports
/// 0% gain, an empty portfolio reports 0% allocation for every row.
pub fn valuate(holdings: &[Holding], cash: f64) -> PortfolioMetrics {
    let portfolio_value: f64 = holdings.iter().map(Holding::market_value).sum();
    let total_cost: f64 = holdings.iter().map(Holding::cost_basis).sum();

    let rows = holdings
        .iter()
        .map(|h| {
            let cost_basis = h.cost_basis();
            let market_value = h.market_value();
            HoldingMetrics {
                symbol: h.symbol.clone(),
                name: h.name.clone(),
                shares: h.shares,
                avg_price: h.avg_price,
                current_price: h.current_price,
                cost_basis,
                market_value,
                gain_loss: market_value - cost_basis,
                gain_loss_percent: percent_over(market_value, cost_basis),
                allocation_percent: share_of(market_value, portfolio_value),
            }
        })
        .collect();

    let account_value = portfolio_value + cash;
    PortfolioMetrics {
        holdings: rows,
        portfolio_value,
        total_cost,
        total_gain_loss: portfolio_value - total_cost,
        total_gain_loss_percent: percent_over(portfolio_value, total_cost),
        cash,
        account_value,
        invested_percent: share_of(portfolio_value, account_value),
        cash_percent: share_of(cash, account_value),
    }
}

/// `((value / base) - 1) * 100`, or 0 when `base` is not positive.
fn percent_over(value: f64, base: f64) -> f64 {
    if base > 0.0 {
        ((value / base) - 1.0) * 100.0
    } else {
        0.0
    }
}

/// `value / total * 100`, or 0 when `total` is not positive.
fn share_of(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}
