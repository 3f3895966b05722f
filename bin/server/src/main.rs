//! FinSight webhook server.

mod config;
mod error;
mod telegram;
mod webhook;

use crate::config::ServerConfig;
use crate::telegram::TelegramClient;
use crate::webhook::AppState;
use axum::routing::get;
use finsight_advisor::Mediator;
use finsight_ai::GeminiModel;
use finsight_conversation::{MemorySessionStore, Router};
use finsight_market::YahooFinanceClient;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let telegram = TelegramClient::new(&config.telegram);

    let mut model = GeminiModel::new(
        config.gemini.api_key.clone(),
        config.gemini.model.clone(),
    );
    if let Some(base_url) = &config.gemini.base_url {
        model = model.with_base_url(base_url.clone());
    }
    tracing::info!(model = %config.gemini.model, "Configured Gemini backend");

    let mut market = YahooFinanceClient::new();
    if let Some(base_url) = &config.market.base_url {
        market = market.with_base_url(base_url.clone());
    }

    let store = Arc::new(MemorySessionStore::new());
    let state = Arc::new(AppState {
        router: Router::new(store),
        mediator: Mediator::new(Arc::new(model), Arc::new(market)),
        telegram,
    });

    let app = axum::Router::new()
        .route("/", get(webhook::index))
        .route(
            "/webhook",
            get(webhook::webhook_status).post(webhook::receive_update),
        )
        .route("/setup_webhook", get(webhook::setup_webhook))
        .route("/get_webhook_info", get(webhook::get_webhook_info))
        .route("/delete_webhook", get(webhook::delete_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .await
        .expect("server error");
}
