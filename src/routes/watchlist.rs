use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::WatchlistQuote;
use crate::services::watchlist_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/watchlist", get(get_watchlist).post(add_symbol))
        .route("/:id/watchlist/:symbol", axum::routing::delete(remove_symbol))
}

#[derive(Debug, Deserialize)]
pub struct AddWatchlistRequest {
    pub symbol: String,
}

pub async fn get_watchlist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<WatchlistQuote>>, AppError> {
    info!("GET /accounts/{}/watchlist - Fetching watchlist", id);
    let rows = watchlist_service::list(
        &state.accounts,
        state.quotes.as_ref(),
        &state.quote_cache,
        id,
    )
    .await
    .map_err(|e| {
        error!("Failed to fetch watchlist for {}: {}", id, e);
        e
    })?;
    Ok(Json(rows))
}

pub async fn add_symbol(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<AddWatchlistRequest>,
) -> Result<Json<Vec<String>>, AppError> {
    info!("POST /accounts/{}/watchlist - Adding {}", id, data.symbol);
    let list = watchlist_service::add(&state.accounts, id, &data.symbol).map_err(|e| {
        error!("Failed to add {} to watchlist: {}", data.symbol, e);
        e
    })?;
    Ok(Json(list))
}

pub async fn remove_symbol(
    State(state): State<AppState>,
    Path((id, symbol)): Path<(Uuid, String)>,
) -> Result<Json<Vec<String>>, AppError> {
    info!("DELETE /accounts/{}/watchlist/{} - Removing symbol", id, symbol);
    let list = watchlist_service::remove(&state.accounts, id, &symbol).map_err(|e| {
        error!("Failed to remove {} from watchlist: {}", symbol, e);
        e
    })?;
    Ok(Json(list))
}
