mod account;
mod holding;
mod ledger;
mod quote;
mod trade;

pub use account::{Account, AccountSummary, OpenAccountRequest};
pub use holding::Holding;
pub use ledger::{
    ActionFilter, HistoryPage, HistoryParams, LedgerEntry, RangeFilter, TradeStatus,
};
pub use quote::{
    HistoryInterval, IndexQuote, MarketIndices, PriceBar, PriceHistoryParams, Quote, SymbolMatch,
    WatchlistQuote,
};
pub use trade::{PlaceTradeRequest, TradeAction, TradeReceipt, TradeRequest};
