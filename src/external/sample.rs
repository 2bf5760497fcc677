use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::debug;

use crate::external::quote_provider::{QuoteError, QuoteProvider};
use crate::models::{HistoryInterval, PriceBar, Quote, SymbolMatch};

struct SampleRow {
    symbol: &'static str,
    name: &'static str,
    price: f64,
    change: f64,
    change_percent: f64,
}

// Snapshot of a plausible trading day. Serves as the offline provider's
// universe and as the hardcoded fallback rows for the market views.
const SAMPLE_ROWS: &[SampleRow] = &[
    SampleRow { symbol: "AAPL", name: "Apple Inc.", price: 178.85, change: 2.75, change_percent: 1.56 },
    SampleRow { symbol: "MSFT", name: "Microsoft Corporation", price: 412.31, change: 5.21, change_percent: 1.28 },
    SampleRow { symbol: "AMZN", name: "Amazon.com, Inc.", price: 181.47, change: -2.35, change_percent: -1.28 },
    SampleRow { symbol: "GOOGL", name: "Alphabet Inc.", price: 159.13, change: 1.78, change_percent: 1.13 },
    SampleRow { symbol: "META", name: "Meta Platforms, Inc.", price: 452.36, change: -3.42, change_percent: -0.75 },
    SampleRow { symbol: "TSLA", name: "Tesla, Inc.", price: 195.70, change: -2.88, change_percent: -1.45 },
    SampleRow { symbol: "NVDA", name: "NVIDIA Corporation", price: 980.75, change: 30.88, change_percent: 3.25 },
    SampleRow { symbol: "AMD", name: "Advanced Micro Devices, Inc.", price: 165.85, change: -2.08, change_percent: -1.24 },
    SampleRow { symbol: "INTC", name: "Intel Corporation", price: 35.42, change: 0.24, change_percent: 0.68 },
    SampleRow { symbol: "JPM", name: "JPMorgan Chase & Co.", price: 198.44, change: 1.83, change_percent: 0.93 },
    SampleRow { symbol: "V", name: "Visa Inc.", price: 275.96, change: -1.12, change_percent: -0.40 },
    SampleRow { symbol: "WMT", name: "Walmart Inc.", price: 68.57, change: 0.41, change_percent: 0.60 },
    SampleRow { symbol: "SPY", name: "SPDR S&P 500 ETF Trust", price: 5304.12, change: 45.81, change_percent: 0.87 },
    SampleRow { symbol: "DIA", name: "SPDR Dow Jones Industrial Average ETF", price: 39651.87, change: 220.92, change_percent: 0.56 },
    SampleRow { symbol: "QQQ", name: "Invesco QQQ Trust", price: 16802.36, change: -37.05, change_percent: -0.22 },
];

fn find_row(symbol: &str) -> Option<&'static SampleRow> {
    SAMPLE_ROWS.iter().find(|r| r.symbol.eq_ignore_ascii_case(symbol))
}

/// The sample quote for `symbol` as of today, without jitter. The market
/// views use this as their last-resort fallback when live data is down.
pub fn sample_quote(symbol: &str) -> Option<Quote> {
    find_row(symbol).map(|row| Quote {
        symbol: row.symbol.to_string(),
        name: row.name.to_string(),
        price: row.price,
        change: row.change,
        change_percent: row.change_percent,
        latest_trading_day: Some(Utc::now().date_naive()),
    })
}

/// Offline quote source backed by the sample table. The default for local
/// development, and the automatic choice when no API key is configured.
pub struct SampleProvider {
    /// Adds a small random wobble to quoted prices so the UI moves between
    /// refreshes. Off in tests, where prices must be exact.
    jitter: bool,
}

impl SampleProvider {
    pub fn new() -> Self {
        Self { jitter: true }
    }

    /// A provider that always answers with the exact table values.
    pub fn fixed() -> Self {
        Self { jitter: false }
    }
}

impl Default for SampleProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for SampleProvider {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let mut quote = sample_quote(symbol).ok_or(QuoteError::NotFound)?;
        if self.jitter {
            // +/- 0.2% wobble
            quote.price *= 1.0 + (rand::random::<f64>() - 0.5) * 0.004;
        }
        Ok(quote)
    }

    async fn get_history(
        &self,
        symbol: &str,
        interval: HistoryInterval,
        bars: u32,
    ) -> Result<Vec<PriceBar>, QuoteError> {
        let row = find_row(symbol).ok_or(QuoteError::NotFound)?;
        let n = bars.max(1) as usize;
        let step_days: i64 = match interval {
            HistoryInterval::Daily => 1,
            HistoryInterval::Weekly => 7,
            HistoryInterval::Monthly => 30,
        };

        // Walk backwards from today's price so the newest bar always matches
        // the current quote.
        let mut closes = vec![0.0_f64; n];
        let mut level = row.price;
        for i in (0..n).rev() {
            closes[i] = level;
            let drift = if self.jitter {
                (rand::random::<f64>() - 0.5) * 0.02
            } else {
                0.02 * ((i as f64) / 4.0).sin()
            };
            level /= 1.0 + drift;
        }

        let today = Utc::now().date_naive();
        let mut out = Vec::with_capacity(n);
        for (i, close) in closes.iter().copied().enumerate() {
            let date = today - Duration::days(step_days * (n - 1 - i) as i64);
            let open = if i == 0 { close } else { closes[i - 1] };
            let volume = if self.jitter {
                (20_000_000.0 + rand::random::<f64>() * 60_000_000.0).round()
            } else {
                50_000_000.0 + 250_000.0 * i as f64
            };
            out.push(PriceBar {
                date,
                open,
                high: open.max(close) * 1.005,
                low: open.min(close) * 0.995,
                close,
                volume,
            });
        }

        debug!("served {} sample {} bars for {}", out.len(), interval.as_str(), symbol);
        Ok(out)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<SymbolMatch>, QuoteError> {
        let needle = keyword.trim().to_uppercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<SymbolMatch> = SAMPLE_ROWS
            .iter()
            .filter_map(|row| {
                let score = if row.symbol == needle {
                    1.0
                } else if row.symbol.starts_with(&needle) {
                    0.8
                } else if row.name.to_uppercase().contains(&needle) {
                    0.6
                } else {
                    return None;
                };
                Some(SymbolMatch {
                    symbol: row.symbol.to_string(),
                    name: row.name.to_string(),
                    match_score: Some(score),
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_provider_serves_exact_table_prices() {
        let provider = SampleProvider::fixed();
        let quote = provider.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.price, 178.85);
        assert_eq!(quote.name, "Apple Inc.");
        assert_eq!(quote.change_percent, 1.56);
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_not_found() {
        let provider = SampleProvider::fixed();
        assert_eq!(
            provider.get_quote("ZZZZ").await.unwrap_err(),
            QuoteError::NotFound
        );
    }

    #[tokio::test]
    async fn test_history_ends_at_current_price() {
        let provider = SampleProvider::fixed();
        let bars = provider
            .get_history("MSFT", HistoryInterval::Daily, 30)
            .await
            .unwrap();

        assert_eq!(bars.len(), 30);
        assert_eq!(bars.last().unwrap().close, 412.31);
        // ascending dates
        for pair in bars.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        // deterministic without jitter
        let again = provider
            .get_history("MSFT", HistoryInterval::Daily, 30)
            .await
            .unwrap();
        assert_eq!(bars, again);
    }

    #[tokio::test]
    async fn test_search_ranks_exact_symbol_first() {
        let provider = SampleProvider::fixed();
        let matches = provider.search("A").await.unwrap();

        assert!(!matches.is_empty());
        // "A" is a prefix of AAPL/AMZN/AMD, never an exact match
        assert!(matches.iter().all(|m| m.match_score.unwrap() < 1.0));

        let exact = provider.search("AAPL").await.unwrap();
        assert_eq!(exact[0].symbol, "AAPL");
        assert_eq!(exact[0].match_score, Some(1.0));
    }

    #[tokio::test]
    async fn test_bars_have_consistent_ranges() {
        let provider = SampleProvider::new();
        let bars = provider
            .get_history("TSLA", HistoryInterval::Weekly, 12)
            .await
            .unwrap();

        for bar in bars {
            assert!(bar.high >= bar.open && bar.high >= bar.close);
            assert!(bar.low <= bar.open && bar.low <= bar.close);
            assert!(bar.volume > 0.0);
        }
    }
}
