use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{accounts, health, market, quotes, trades, watchlist};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    // trades and watchlist hang off the account resource, so they share its prefix
    let account_routes = accounts::router()
        .merge(trades::router())
        .merge(watchlist::router());

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/accounts", account_routes)
        .nest("/api/market", market::router())
        .nest("/api/quotes", quotes::router())
        // the SPA is served from a different origin during development
        .layer(CorsLayer::permissive())
        .with_state(state)
}
