mod auth;
mod config;
mod error;
mod extract;
mod routes;
mod state;

use anyhow::{bail, Context};
use std::sync::Arc;
use tally_receipt::{OpenAiBackend, ReceiptPipeline};
use tally_storage::Store;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::state::{AppState, SharedBackend};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let formatting = BunyanFormattingLayer::new("tally-server".into(), std::io::stdout);
    tracing_subscriber::registry()
        .with(filter)
        .with(JsonStorageLayer)
        .with(formatting)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load().context("Failed to load configuration")?;
    if config.auth.jwt_secret.is_empty() {
        bail!("auth.jwt_secret is not set (config file or TALLY_JWT_SECRET)");
    }
    let jwt = JwtKeys::new(config.auth.jwt_secret.as_bytes());

    // `tally-server token <user-id>` prints a 30-day token for local use.
    let args: Vec<String> = std::env::args().collect();
    if let [_, cmd, user] = args.as_slice() {
        if cmd == "token" {
            let token = jwt.issue(user, chrono::Duration::days(30))?;
            println!("{token}");
            return Ok(());
        }
    }

    if let Some(parent) = config.database.path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = Store::open(&config.database.path, config.database.retry_policy())
        .await
        .context("Failed to open database")?;
    tracing::info!(path = %config.database.path.display(), "Database ready");

    let backend: SharedBackend = Arc::new(
        OpenAiBackend::new(config.ai.to_openai()).context("Failed to create completion client")?,
    );
    if config.ai.api_key.is_empty() {
        tracing::warn!("No AI API key configured; receipt scans will fail upstream");
    }
    let pipeline = ReceiptPipeline::new(backend, config.receipts.upload_dir.clone())
        .with_virtual_prefix(config.receipts.virtual_prefix.clone());

    let app = routes::router(AppState::new(store, pipeline, jwt));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!(bind = %config.server.bind, "Listening");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
