use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{HistoryPage, HistoryParams, PlaceTradeRequest, TradeReceipt};
use crate::services::{history_service, trade_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/trades", post(place_trade))
        .route("/:id/history", get(get_history))
}

#[axum::debug_handler]
pub async fn place_trade(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<PlaceTradeRequest>,
) -> Result<Json<TradeReceipt>, AppError> {
    info!(
        "POST /accounts/{}/trades - {:?} {} x{}",
        id, data.action, data.symbol, data.quantity
    );
    let receipt = trade_service::place_trade(
        &state.accounts,
        state.quotes.as_ref(),
        &state.quote_cache,
        id,
        data,
    )
    .await
    .map_err(|e| {
        error!("Trade on account {} rejected: {}", id, e);
        e
    })?;
    Ok(Json(receipt))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryPage>, AppError> {
    info!("GET /accounts/{}/history - Fetching trade history", id);
    let page = history_service::history(&state.accounts, id, params).map_err(|e| {
        error!("Failed to fetch history for {}: {}", id, e);
        e
    })?;
    Ok(Json(page))
}
