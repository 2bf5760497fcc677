use axum::extract::{Path, State};
use axum::routing::get;
use axum::routing::post;
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Account, AccountSummary, OpenAccountRequest};
use crate::services::{account_service, portfolio_service};
use crate::services::portfolio_service::PortfolioView;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(open_account).get(list_accounts))
        .route("/:id", get(get_account).delete(close_account))
        .route("/:id/portfolio", get(get_portfolio))
}

#[axum::debug_handler]
pub async fn open_account(
    State(state): State<AppState>,
    Json(data): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    info!("POST /accounts - Opening new account");
    let account = account_service::open(&state.accounts, data).map_err(|e| {
        error!("Failed to open account: {}", e);
        e
    })?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountSummary>>, AppError> {
    info!("GET /accounts - Listing accounts");
    Ok(Json(account_service::list(&state.accounts)))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, AppError> {
    info!("GET /accounts/{} - Fetching account", id);
    let account = account_service::get(&state.accounts, id)?;
    Ok(Json(account))
}

pub async fn close_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /accounts/{} - Closing account", id);
    account_service::close(&state.accounts, id).map_err(|e| {
        error!("Failed to close account {}: {}", id, e);
        e
    })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PortfolioView>, AppError> {
    info!("GET /accounts/{}/portfolio - Valuing portfolio", id);
    let view = portfolio_service::view(&state.accounts, state.quotes.as_ref(), &state.quote_cache, id)
        .await
        .map_err(|e| {
            error!("Failed to value portfolio {}: {}", id, e);
            e
        })?;
    Ok(Json(view))
}
