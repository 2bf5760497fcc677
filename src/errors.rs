use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::engine::TradeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("insufficient funds: order costs {required:.2} but only {available:.2} is available")]
    InsufficientFunds { required: f64, available: f64 },
    #[error("insufficient shares of {symbol}: tried to sell {requested} but only {held} held")]
    InsufficientShares {
        symbol: String,
        requested: u32,
        held: u32,
    },
    #[error("invalid quantity {quantity}: must be between 1 and 999999")]
    InvalidQuantity { quantity: u32 },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unknown symbol: {0}")]
    SymbolNotFound(String),
    #[error("No quote available for {0}")]
    QuoteUnavailable(String),
    #[error("Not found")]
    NotFound,
    #[error("Rate limited by external provider")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
}

impl AppError {
    /// Stable machine-readable code carried in the JSON body next to the
    /// human-readable message.
    fn reason(&self) -> &'static str {
        match self {
            AppError::InsufficientFunds { .. } => "insufficient_funds",
            AppError::InsufficientShares { .. } => "insufficient_shares",
            AppError::InvalidQuantity { .. } => "invalid_quantity",
            AppError::Validation(_) => "validation",
            AppError::SymbolNotFound(_) => "symbol_not_found",
            AppError::QuoteUnavailable(_) => "quote_unavailable",
            AppError::NotFound => "not_found",
            AppError::RateLimited => "rate_limited",
            AppError::External(_) => "external",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InsufficientFunds { .. }
            | AppError::InsufficientShares { .. }
            | AppError::InvalidQuantity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::SymbolNotFound(_) | AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::QuoteUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::External(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({
            "error": self.to_string(),
            "reason": self.reason(),
        }));
        match self {
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (StatusCode::TOO_MANY_REQUESTS, headers, body).into_response()
            }
            other => (other.status(), body).into_response(),
        }
    }
}

impl From<TradeError> for AppError {
    fn from(value: TradeError) -> Self {
        match value {
            TradeError::InsufficientFunds {
                required,
                available,
            } => AppError::InsufficientFunds {
                required,
                available,
            },
            TradeError::InsufficientShares {
                symbol,
                requested,
                held,
            } => AppError::InsufficientShares {
                symbol,
                requested,
                held,
            },
            TradeError::InvalidQuantity { quantity } => AppError::InvalidQuantity { quantity },
            TradeError::InvalidPrice { price } => {
                AppError::Validation(format!("invalid price {price}: must be a positive amount"))
            }
        }
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}
