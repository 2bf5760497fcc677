use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::models::Quote;

/// A quote together with the moment it was fetched.
#[derive(Debug, Clone)]
pub struct CachedQuote {
    pub quote: Quote,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Symbol does not exist at the provider.
    NotFound,
    /// Temporary throttle.
    RateLimited,
    /// Anything else (network, parse, bad response).
    Other,
}

#[derive(Debug, Clone)]
struct FailureInfo {
    failed_at: DateTime<Utc>,
    kind: FailureKind,
    ttl: Duration,
}

/// Thread-safe quote cache with two sides.
///
/// The positive side keeps the last good quote per symbol so a provider
/// outage degrades to stale data instead of an error. The negative side
/// remembers recent failures so known-bad symbols don't burn through the
/// provider quota on every request.
#[derive(Clone)]
pub struct QuoteCache {
    quotes: Arc<DashMap<String, CachedQuote>>,
    failures: Arc<DashMap<String, FailureInfo>>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self {
            quotes: Arc::new(DashMap::new()),
            failures: Arc::new(DashMap::new()),
        }
    }

    /// Records a good quote and forgets any failure for the symbol.
    pub fn store(&self, quote: &Quote) {
        self.failures.remove(&quote.symbol);
        self.quotes.insert(
            quote.symbol.clone(),
            CachedQuote {
                quote: quote.clone(),
                fetched_at: Utc::now(),
            },
        );
    }

    /// The cached quote if it is younger than `max_age`.
    pub fn fresh(&self, symbol: &str, max_age: Duration) -> Option<Quote> {
        let entry = self.quotes.get(symbol)?;
        if Utc::now() - entry.fetched_at < max_age {
            Some(entry.quote.clone())
        } else {
            None
        }
    }

    /// The last good quote regardless of age, for stale fallbacks.
    pub fn last_known(&self, symbol: &str) -> Option<CachedQuote> {
        self.quotes.get(symbol).map(|entry| entry.clone())
    }

    /// Records a failed fetch. How long the failure sticks depends on what
    /// went wrong: a missing symbol won't start existing today, but a
    /// throttle clears quickly.
    pub fn record_failure(&self, symbol: &str, kind: FailureKind) {
        let ttl = match kind {
            FailureKind::NotFound => Duration::hours(24),
            FailureKind::RateLimited => Duration::minutes(5),
            FailureKind::Other => Duration::minutes(30),
        };
        self.failures.insert(
            symbol.to_string(),
            FailureInfo {
                failed_at: Utc::now(),
                kind,
                ttl,
            },
        );
    }

    /// The failure recorded for `symbol`, if it is still within its TTL.
    /// Expired entries are removed on the way out.
    pub fn active_failure(&self, symbol: &str) -> Option<FailureKind> {
        if let Some(entry) = self.failures.get(symbol) {
            let info = entry.value().clone();
            if Utc::now() < info.failed_at + info.ttl {
                return Some(info.kind);
            }
            drop(entry); // release the read lock before removing
            self.failures.remove(symbol);
        }
        None
    }

    pub fn clear_failure(&self, symbol: &str) {
        self.failures.remove(symbol);
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}
