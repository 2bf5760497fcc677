use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::external::quote_provider::{QuoteError, QuoteProvider};
use crate::models::{HistoryInterval, PriceBar, Quote, SymbolMatch};
use crate::services::rate_limiter::RateLimiter;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

// Free tier: 5 requests per minute, 500 per day.
const REQUESTS_PER_MINUTE: u32 = 5;

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: RateLimiter,
}

impl AlphaVantageProvider {
    pub fn from_env() -> Result<Self, QuoteError> {
        let api_key = std::env::var("ALPHAVANTAGE_API_KEY")
            .map_err(|_| QuoteError::BadResponse("ALPHAVANTAGE_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            limiter: RateLimiter::per_minute(REQUESTS_PER_MINUTE, 2),
        }
    }

    /// Points the provider at a different endpoint. Used by tests to target
    /// a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, QuoteError> {
        let _guard = self.limiter.acquire().await;

        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        resp.json::<T>()
            .await
            .map_err(|e| QuoteError::Parse(e.to_string()))
    }

    /// Company name from the OVERVIEW endpoint. Falls back to the symbol
    /// itself on any failure so a missing profile never sinks the quote.
    async fn company_name(&self, symbol: &str) -> String {
        let overview: Result<AvOverviewResponse, QuoteError> = self
            .get_json(&[("function", "OVERVIEW"), ("symbol", symbol)])
            .await;

        match overview {
            Ok(body) => match body.name {
                Some(name) if !name.is_empty() => name,
                _ => symbol.to_string(),
            },
            Err(e) => {
                debug!("OVERVIEW lookup failed for {}: {}, using symbol as name", symbol, e);
                symbol.to_string()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response shapes. Alpha Vantage keys fields with numbered labels and signals
// throttling through a "Note" field on an otherwise-200 response.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AvQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<AvGlobalQuote>,

    // When rate-limited:
    // { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    #[serde(rename = "Note")]
    note: Option<String>,

    // When invalid:
    // { "Error Message": "Invalid API call. ..." }
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

// An unknown symbol comes back as { "Global Quote": {} }, so every field
// has to be optional.
#[derive(Debug, Deserialize)]
struct AvGlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvOverviewResponse {
    #[serde(rename = "Name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    daily: Option<BTreeMap<String, AvBar>>,
    #[serde(rename = "Weekly Time Series")]
    weekly: Option<BTreeMap<String, AvBar>>,
    #[serde(rename = "Monthly Time Series")]
    monthly: Option<BTreeMap<String, AvBar>>,

    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

#[derive(Debug, Deserialize)]
struct AvSearchResponse {
    #[serde(rename = "bestMatches")]
    best_matches: Option<Vec<AvMatch>>,

    #[serde(rename = "Note")]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
    #[serde(rename = "9. matchScore")]
    match_score: Option<String>,
}

fn parse_f64(field: &str, raw: &str) -> Result<f64, QuoteError> {
    raw.parse::<f64>()
        .map_err(|e| QuoteError::Parse(format!("{field} '{raw}': {e}")))
}

fn parse_date(raw: &str) -> Result<NaiveDate, QuoteError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| QuoteError::Parse(e.to_string()))
}

fn series_function(interval: HistoryInterval) -> &'static str {
    match interval {
        HistoryInterval::Daily => "TIME_SERIES_DAILY",
        HistoryInterval::Weekly => "TIME_SERIES_WEEKLY",
        HistoryInterval::Monthly => "TIME_SERIES_MONTHLY",
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let body: AvQuoteResponse = self
            .get_json(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;

        if body.note.is_some() {
            return Err(QuoteError::RateLimited);
        }
        if let Some(msg) = body.error_message {
            return Err(QuoteError::BadResponse(msg));
        }

        // Unknown symbols answer with an empty quote object rather than an error.
        let quote = body.global_quote.ok_or(QuoteError::NotFound)?;
        let (Some(price), Some(change), Some(change_percent)) =
            (quote.price, quote.change, quote.change_percent)
        else {
            return Err(QuoteError::NotFound);
        };

        let price = parse_f64("price", &price)?;
        let change = parse_f64("change", &change)?;
        // reported as e.g. "1.5600%"
        let change_percent = parse_f64("change percent", change_percent.trim_end_matches('%'))?;
        let latest_trading_day = match quote.latest_trading_day {
            Some(raw) => Some(parse_date(&raw)?),
            None => None,
        };

        let symbol = quote.symbol.unwrap_or_else(|| symbol.to_string());
        let name = self.company_name(&symbol).await;

        Ok(Quote {
            symbol,
            name,
            price,
            change,
            change_percent,
            latest_trading_day,
        })
    }

    async fn get_history(
        &self,
        symbol: &str,
        interval: HistoryInterval,
        bars: u32,
    ) -> Result<Vec<PriceBar>, QuoteError> {
        // Daily supports compact (~100 bars) vs full (20+ years); the weekly
        // and monthly endpoints always return the full series.
        let outputsize = if bars <= 100 { "compact" } else { "full" };

        let body: AvSeriesResponse = self
            .get_json(&[
                ("function", series_function(interval)),
                ("symbol", symbol),
                ("outputsize", outputsize),
            ])
            .await?;

        if body.note.is_some() {
            return Err(QuoteError::RateLimited);
        }
        if let Some(msg) = body.error_message {
            return Err(QuoteError::BadResponse(msg));
        }

        let series = match interval {
            HistoryInterval::Daily => body.daily,
            HistoryInterval::Weekly => body.weekly,
            HistoryInterval::Monthly => body.monthly,
        }
        .ok_or(QuoteError::NotFound)?;

        // Keys are "YYYY-MM-DD" strings, so the BTreeMap iterates ascending.
        let mut out = Vec::with_capacity(series.len());
        for (date_str, bar) in series {
            out.push(PriceBar {
                date: parse_date(&date_str)?,
                open: parse_f64("open", &bar.open)?,
                high: parse_f64("high", &bar.high)?,
                low: parse_f64("low", &bar.low)?,
                close: parse_f64("close", &bar.close)?,
                volume: parse_f64("volume", &bar.volume)?,
            });
        }

        // Trim to the latest N while keeping ascending order.
        if bars > 0 && out.len() as u32 > bars {
            let keep = bars as usize;
            out = out.into_iter().rev().take(keep).collect::<Vec<_>>();
            out.reverse();
        }

        Ok(out)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<SymbolMatch>, QuoteError> {
        let body: AvSearchResponse = self
            .get_json(&[("function", "SYMBOL_SEARCH"), ("keywords", keyword)])
            .await?;

        if body.note.is_some() {
            return Err(QuoteError::RateLimited);
        }

        let matches = body
            .best_matches
            .unwrap_or_default()
            .into_iter()
            .map(|m| SymbolMatch {
                symbol: m.symbol,
                name: m.name,
                match_score: m.match_score.and_then(|s| s.parse::<f64>().ok()),
            })
            .collect();
        Ok(matches)
    }
}
