pub mod trade;
pub mod valuation;

pub use trade::{execute, validate, Execution, TradeError, MAX_TRADE_QUANTITY};
pub use valuation::{valuate, HoldingMetrics, PortfolioMetrics};
