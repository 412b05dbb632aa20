use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod proxy;
mod studio;
mod web;

use config::Config;
use error::AppError;
use proxy::RewriteTable;
use studio::HttpTtsApi;
use web::routes::{create_router, AppState};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing::info!("TTS Studio v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Starting server on http://{}", config.addr);
    tracing::info!("Upstream TTS API: {}", config.api_base_url);
    if config.api_key.is_none() {
        tracing::warn!("API_KEY is not set, upstream calls go out without Authorization");
    }

    let mut client = reqwest::Client::builder();
    if let Some(timeout) = config.upstream_timeout {
        client = client.timeout(timeout);
    }
    let http = client.build()?;

    let rewrites = RewriteTable::for_upstream(&config.api_base_url, config.api_key.clone());
    let api = HttpTtsApi::new(http.clone(), &rewrites)
        .map_err(|e| AppError::Config(e.to_string()))?;

    let state = Arc::new(AppState::new(
        rewrites,
        http,
        Arc::new(api),
        config.static_dir.clone(),
    )
    .with_session_limit(config.max_sessions));

    spawn_session_sweeper(Arc::clone(&state), config.session_idle);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_session_sweeper(state: Arc<AppState>, max_idle: Duration) {
    let period = (max_idle / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = state.sessions.sweep_idle(max_idle);
            if removed > 0 {
                tracing::info!("Expired {} idle sessions", removed);
            }
        }
    });
}
