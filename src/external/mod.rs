pub mod alphavantage;
pub mod finnhub;
pub mod multi_provider;
pub mod quote_provider;
pub mod sample;

pub use alphavantage::AlphaVantageProvider;
pub use finnhub::FinnhubProvider;
pub use multi_provider::MultiProvider;
pub use quote_provider::{QuoteError, QuoteProvider};
pub use sample::{sample_quote, SampleProvider};
