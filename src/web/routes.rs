use axum::{
    http::{header, Method},
    routing::{any, get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers;
use super::sessions::{SessionStore, DEFAULT_MAX_SESSIONS};
use crate::proxy::{self, RewriteTable};
use crate::studio::{AudioStore, TtsApi};

pub struct AppState {
    pub rewrites: RewriteTable,
    pub http: reqwest::Client,
    pub api: Arc<dyn TtsApi>,
    pub sessions: SessionStore,
    pub audio: AudioStore,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        rewrites: RewriteTable,
        http: reqwest::Client,
        api: Arc<dyn TtsApi>,
        static_dir: PathBuf,
    ) -> Self {
        Self {
            rewrites,
            http,
            api,
            sessions: SessionStore::new(DEFAULT_MAX_SESSIONS),
            audio: AudioStore::new(),
            static_dir,
        }
    }

    pub fn with_session_limit(mut self, max_sessions: usize) -> Self {
        self.sessions = SessionStore::new(max_sessions);
        self
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(handlers::index).post(handlers::update))
        .route("/catalog/reload", post(handlers::reload_catalog))
        .route("/session/end", post(handlers::end_session))
        .route("/audio/:id", get(handlers::audio))
        .route("/health", get(handlers::health))
        .route("/api/*path", any(proxy::handler::forward))
        .nest_service("/static", static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
