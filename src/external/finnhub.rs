use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::external::quote_provider::{QuoteError, QuoteProvider};
use crate::models::{HistoryInterval, PriceBar, Quote, SymbolMatch};
use crate::services::rate_limiter::RateLimiter;

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

// Free tier: 60 requests per minute.
const REQUESTS_PER_MINUTE: u32 = 60;

pub struct FinnhubProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: RateLimiter,
}

impl FinnhubProvider {
    pub fn from_env() -> Result<Self, QuoteError> {
        let api_key = std::env::var("FINNHUB_API_KEY")
            .map_err(|_| QuoteError::BadResponse("FINNHUB_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            limiter: RateLimiter::per_minute(REQUESTS_PER_MINUTE, 4),
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
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, QuoteError> {
        let _guard = self.limiter.acquire().await;

        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(url)
            .query(params)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(QuoteError::BadResponse(format!(
                "{} returned {}",
                path,
                resp.status()
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| QuoteError::Parse(e.to_string()))
    }

    async fn company_name(&self, symbol: &str) -> String {
        let profile: Result<FhProfile, QuoteError> = self
            .get_json("/stock/profile2", &[("symbol", symbol)])
            .await;

        match profile {
            Ok(body) => match body.name {
                Some(name) if !name.is_empty() => name,
                _ => symbol.to_string(),
            },
            Err(e) => {
                debug!("profile2 lookup failed for {}: {}, using symbol as name", symbol, e);
                symbol.to_string()
            }
        }
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct FhQuote {
    /// Current price.
    c: f64,
    /// Change, absent for symbols Finnhub cannot price.
    d: Option<f64>,
    /// Percent change.
    dp: Option<f64>,
    /// Previous close.
    pc: f64,
    /// Timestamp of the quote, unix seconds.
    t: i64,
}

#[derive(Debug, Deserialize)]
struct FhProfile {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FhCandles {
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct FhSearchResponse {
    #[serde(default)]
    result: Vec<FhSearchRow>,
}

#[derive(Debug, Deserialize)]
struct FhSearchRow {
    description: String,
    symbol: String,
}

fn resolution(interval: HistoryInterval) -> &'static str {
    match interval {
        HistoryInterval::Daily => "D",
        HistoryInterval::Weekly => "W",
        HistoryInterval::Monthly => "M",
    }
}

fn timestamp_to_date(secs: i64) -> Result<NaiveDate, QuoteError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| QuoteError::Parse(format!("bad timestamp {secs}")))
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let body: FhQuote = self.get_json("/quote", &[("symbol", symbol)]).await?;

        // Unknown symbols come back as an all-zero quote, not an error.
        if body.c == 0.0 && body.t == 0 {
            return Err(QuoteError::NotFound);
        }

        let change = body.d.unwrap_or(body.c - body.pc);
        let change_percent = body.dp.unwrap_or(if body.pc > 0.0 {
            ((body.c / body.pc) - 1.0) * 100.0
        } else {
            0.0
        });
        let latest_trading_day = if body.t > 0 {
            Some(timestamp_to_date(body.t)?)
        } else {
            None
        };

        let name = self.company_name(symbol).await;

        Ok(Quote {
            symbol: symbol.to_string(),
            name,
            price: body.c,
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
        // Window sized with margin for weekends and holidays, trimmed below.
        let span_days = match interval {
            HistoryInterval::Daily => u64::from(bars) * 2,
            HistoryInterval::Weekly => u64::from(bars) * 8,
            HistoryInterval::Monthly => u64::from(bars) * 32,
        };
        let to = Utc::now().timestamp();
        let from = to - span_days as i64 * 86_400;

        let body: FhCandles = self
            .get_json(
                "/stock/candle",
                &[
                    ("symbol", symbol),
                    ("resolution", resolution(interval)),
                    ("from", &from.to_string()),
                    ("to", &to.to_string()),
                ],
            )
            .await?;

        if body.s == "no_data" {
            return Err(QuoteError::NotFound);
        }
        if body.s != "ok" {
            return Err(QuoteError::BadResponse(format!("candle status '{}'", body.s)));
        }

        let n = body.t.len();
        if body.o.len() != n || body.h.len() != n || body.l.len() != n
            || body.c.len() != n || body.v.len() != n
        {
            return Err(QuoteError::BadResponse("candle arrays disagree in length".into()));
        }

        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            out.push(PriceBar {
                date: timestamp_to_date(body.t[i])?,
                open: body.o[i],
                high: body.h[i],
                low: body.l[i],
                close: body.c[i],
                volume: body.v[i],
            });
        }

        // Candles arrive oldest first already; keep only the latest N.
        if bars > 0 && out.len() as u32 > bars {
            let skip = out.len() - bars as usize;
            out.drain(..skip);
        }

        Ok(out)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<SymbolMatch>, QuoteError> {
        let body: FhSearchResponse = self.get_json("/search", &[("q", keyword)]).await?;

        Ok(body
            .result
            .into_iter()
            .map(|row| SymbolMatch {
                symbol: row.symbol,
                name: row.description,
                match_score: None,
            })
            .collect())
    }
}
