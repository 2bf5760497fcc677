use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{MarketIndices, Quote, SymbolMatch};
use crate::services::market_service;
use crate::state::AppState;

// ==============================================================================
// Router
// ==============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/movers", get(get_movers))
        .route("/gainers", get(get_gainers))
        .route("/losers", get(get_losers))
        .route("/indices", get(get_indices))
        .route("/search", get(search_symbols))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

// ==============================================================================
// Handlers
// ==============================================================================

pub async fn get_movers(State(state): State<AppState>) -> Json<Vec<Quote>> {
    info!("GET /market/movers - Fetching market movers");
    Json(market_service::movers(state.quotes.as_ref(), &state.quote_cache).await)
}

pub async fn get_gainers(State(state): State<AppState>) -> Json<Vec<Quote>> {
    info!("GET /market/gainers - Fetching top gainers");
    Json(market_service::top_gainers(state.quotes.as_ref(), &state.quote_cache).await)
}

pub async fn get_losers(State(state): State<AppState>) -> Json<Vec<Quote>> {
    info!("GET /market/losers - Fetching top losers");
    Json(market_service::top_losers(state.quotes.as_ref(), &state.quote_cache).await)
}

pub async fn get_indices(State(state): State<AppState>) -> Json<MarketIndices> {
    info!("GET /market/indices - Fetching index snapshot");
    Json(market_service::indices(state.quotes.as_ref(), &state.quote_cache).await)
}

pub async fn search_symbols(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SymbolMatch>>, AppError> {
    info!("GET /market/search - Searching '{}'", params.q);
    let matches = market_service::search(state.quotes.as_ref(), &params.q)
        .await
        .map_err(|e| {
            error!("Symbol search failed: {}", e);
            e
        })?;
    Ok(Json(matches))
}
