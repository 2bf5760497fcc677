use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{PriceBar, PriceHistoryParams, Quote};
use crate::services::{market_service, quote_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol", get(get_quote))
        .route("/:symbol/history", get(get_price_history))
}

pub async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Quote>, AppError> {
    info!("GET /quotes/{} - Fetching quote", symbol);
    let symbol = market_service::normalize_symbol(&symbol)?;
    let resolved = quote_service::get_quote(state.quotes.as_ref(), &state.quote_cache, &symbol)
        .await
        .map_err(|e| {
            error!("Quote lookup failed for {}: {}", symbol, e);
            e
        })?;
    Ok(Json(resolved.quote))
}

pub async fn get_price_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<PriceHistoryParams>,
) -> Result<Json<Vec<PriceBar>>, AppError> {
    info!(
        "GET /quotes/{}/history - {} bars, {} interval",
        symbol,
        params.days,
        params.interval.as_str()
    );
    let symbol = market_service::normalize_symbol(&symbol)?;
    let bars = quote_service::get_history(
        state.quotes.as_ref(),
        &symbol,
        params.interval,
        params.days,
    )
    .await
    .map_err(|e| {
        error!("History lookup failed for {}: {}", symbol, e);
        e
    })?;
    Ok(Json(bars))
}
