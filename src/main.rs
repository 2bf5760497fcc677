use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use papertrade::app;
use papertrade::external::{
    AlphaVantageProvider, FinnhubProvider, MultiProvider, QuoteProvider, SampleProvider,
};
use papertrade::logging::{init_logging, LoggingConfig};
use papertrade::services::account_service;
use papertrade::state::AppState;
use papertrade::store::AccountStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    // Select quote provider based on QUOTE_PROVIDER env var (defaults to sample,
    // which needs no API keys)
    let provider_name =
        std::env::var("QUOTE_PROVIDER").unwrap_or_else(|_| "sample".to_string());

    let provider: Arc<dyn QuoteProvider> = match provider_name.to_lowercase().as_str() {
        "sample" => {
            tracing::info!("📊 Using quote provider: built-in sample data");
            Arc::new(SampleProvider::new())
        }
        "alphavantage" => {
            tracing::info!("📊 Using quote provider: Alpha Vantage only");
            Arc::new(
                AlphaVantageProvider::from_env().context("check ALPHAVANTAGE_API_KEY")?,
            )
        }
        "finnhub" => {
            tracing::info!("📊 Using quote provider: Finnhub only");
            Arc::new(FinnhubProvider::from_env().context("check FINNHUB_API_KEY")?)
        }
        "multi" => {
            tracing::info!(
                "📊 Using quote provider: Multi-provider (Alpha Vantage + Finnhub fallback)"
            );
            let primary = Box::new(
                AlphaVantageProvider::from_env().context("check ALPHAVANTAGE_API_KEY")?,
            );
            let fallback =
                Box::new(FinnhubProvider::from_env().context("check FINNHUB_API_KEY")?);
            Arc::new(MultiProvider::new(primary, fallback))
        }
        _ => anyhow::bail!(
            "Invalid QUOTE_PROVIDER: {}. Must be 'sample', 'alphavantage', 'finnhub', or 'multi'",
            provider_name
        ),
    };

    let starting_cash: f64 = std::env::var("STARTING_CASH")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10_000.0);
    let accounts = AccountStore::new(starting_cash);

    // Accounts live in memory, so seed one by default to have something to
    // trade against right away. DEMO_ACCOUNT=false disables it.
    let seed_demo = std::env::var("DEMO_ACCOUNT")
        .unwrap_or_else(|_| "true".to_string())
        .parse()
        .unwrap_or(true);
    if seed_demo {
        let demo = account_service::seed_demo(&accounts);
        tracing::info!("Demo account ready: /api/accounts/{}", demo.id);
    }

    let state = AppState::new(accounts, provider);
    let app = app::create_app(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("🚀 Papertrade backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
