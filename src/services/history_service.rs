use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{HistoryPage, HistoryParams, LedgerEntry};
use crate::services::market_service;
use crate::store::AccountStore;

pub const MAX_PAGE_SIZE: usize = 100;

/// Filters and paginates an account's trade ledger, newest entries first.
///
/// Filters combine with AND: action, time range, and exact symbol. `total`
/// counts the filtered set before pagination so clients can render page
/// controls.
pub fn history(
    store: &AccountStore,
    account_id: Uuid,
    params: HistoryParams,
) -> Result<HistoryPage, AppError> {
    let entries = store.ledger(account_id).ok_or(AppError::NotFound)?;

    let symbol = match &params.symbol {
        Some(raw) if !raw.trim().is_empty() => Some(market_service::normalize_symbol(raw)?),
        _ => None,
    };
    let cutoff = params.range.cutoff(Utc::now());

    let mut filtered: Vec<LedgerEntry> = entries
        .into_iter()
        .filter(|e| params.action.matches(e.action))
        .filter(|e| symbol.as_deref().map_or(true, |s| e.symbol == s))
        .filter(|e| cutoff.map_or(true, |c| e.executed_at >= c))
        .collect();
    filtered.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));

    let total = filtered.len();
    let page = params.page.max(1);
    let page_size = params.page_size.clamp(1, MAX_PAGE_SIZE);
    // page comes straight off the query string; saturate instead of wrapping
    let entries = filtered
        .into_iter()
        .skip(page.saturating_sub(1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    Ok(HistoryPage {
        entries,
        total,
        page,
        page_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionFilter, RangeFilter, TradeAction};
    use chrono::Duration;

    fn seeded_store() -> (AccountStore, Uuid) {
        let store = AccountStore::new(10_000.0);
        let account = store.open(10_000.0);
        let rows: [(&str, TradeAction, i64); 4] = [
            ("AAPL", TradeAction::Buy, 40),
            ("MSFT", TradeAction::Buy, 10),
            ("AAPL", TradeAction::Sell, 5),
            ("TSLA", TradeAction::Buy, 1),
        ];
        store
            .with_state(account.id, |state| {
                for (symbol, action, days_ago) in rows {
                    let mut entry = LedgerEntry::new(
                        symbol.to_string(),
                        symbol.to_string(),
                        action,
                        1,
                        100.0,
                    );
                    entry.executed_at = Utc::now() - Duration::days(days_ago);
                    state.ledger.push(entry);
                }
            })
            .unwrap();
        (store, account.id)
    }

    #[test]
    fn test_unfiltered_history_is_newest_first() {
        let (store, id) = seeded_store();
        let page = history(&store, id, HistoryParams::default()).unwrap();

        assert_eq!(page.total, 4);
        assert_eq!(page.entries.len(), 4);
        assert_eq!(page.entries[0].symbol, "TSLA");
        assert_eq!(page.entries[3].symbol, "AAPL");
        for pair in page.entries.windows(2) {
            assert!(pair[0].executed_at >= pair[1].executed_at);
        }
    }

    #[test]
    fn test_action_filter() {
        let (store, id) = seeded_store();
        let page = history(
            &store,
            id,
            HistoryParams {
                action: ActionFilter::Sell,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].action, TradeAction::Sell);
        assert_eq!(page.entries[0].symbol, "AAPL");
    }

    #[test]
    fn test_range_filter_cuts_old_entries() {
        let (store, id) = seeded_store();
        let page = history(
            &store,
            id,
            HistoryParams {
                range: RangeFilter::Week,
                ..Default::default()
            },
        )
        .unwrap();

        // only the 5-days-ago sell and the 1-day-ago buy fall inside 7d
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_symbol_filter_is_case_insensitive() {
        let (store, id) = seeded_store();
        let page = history(
            &store,
            id,
            HistoryParams {
                symbol: Some("aapl".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(page.total, 2);
        assert!(page.entries.iter().all(|e| e.symbol == "AAPL"));
    }

    #[test]
    fn test_filters_combine() {
        let (store, id) = seeded_store();
        let page = history(
            &store,
            id,
            HistoryParams {
                action: ActionFilter::Buy,
                range: RangeFilter::Month,
                symbol: Some("AAPL".into()),
                ..Default::default()
            },
        )
        .unwrap();

        // the only AAPL buy is 40 days old, outside the 30d range
        assert_eq!(page.total, 0);
        assert!(page.entries.is_empty());
    }

    #[test]
    fn test_pagination_slices_and_reports_total() {
        let (store, id) = seeded_store();
        let page = history(
            &store,
            id,
            HistoryParams {
                page: 2,
                page_size: 3,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(page.total, 4);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 3);
        assert_eq!(page.entries.len(), 1);
        // page 2 of 3-per-page holds the single oldest entry
        assert_eq!(page.entries[0].symbol, "AAPL");
    }

    #[test]
    fn test_page_beyond_end_is_empty_not_error() {
        let (store, id) = seeded_store();
        let page = history(
            &store,
            id,
            HistoryParams {
                page: 99,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(page.total, 4);
        assert!(page.entries.is_empty());
    }

    #[test]
    fn test_page_at_usize_max_is_empty() {
        let (store, id) = seeded_store();

        // offsets that would overflow `page * page_size` must still serve an
        // empty page, never the first page under an absurd label
        for page in [usize::MAX, usize::MAX / 2] {
            let served = history(
                &store,
                id,
                HistoryParams {
                    page,
                    page_size: 16,
                    ..Default::default()
                },
            )
            .unwrap();

            assert_eq!(served.total, 4);
            assert_eq!(served.page, page);
            assert!(served.entries.is_empty());
        }
    }

    #[test]
    fn test_missing_account() {
        let store = AccountStore::new(10_000.0);
        assert!(matches!(
            history(&store, Uuid::new_v4(), HistoryParams::default()).unwrap_err(),
            AppError::NotFound
        ));
    }
}
