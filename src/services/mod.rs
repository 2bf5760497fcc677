pub mod account_service;
pub mod history_service;
pub mod market_service;
pub mod portfolio_service;
pub mod quote_cache;
pub mod quote_service;
pub mod rate_limiter;
pub mod trade_service;
pub mod watchlist_service;
