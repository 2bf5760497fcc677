pub mod accounts;
pub mod health;
pub mod market;
pub mod quotes;
pub mod trades;
pub mod watchlist;
