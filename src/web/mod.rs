//! HTTP Surface: route dispatch, auth gating, and error envelopes, built on
//! `axum`.

pub mod handlers;
pub mod responses;

use crate::auth::{AuthService, extract_bearer};
use crate::cache::TtlCache;
use crate::catalog::CatalogService;
use crate::config::Config;
use crate::health::HealthTracker;
use crate::proxy::MediaProxy;
use crate::registry::InstanceRegistry;
use crate::resolver::StreamResolver;
use crate::upstream::UpstreamClient;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<InstanceRegistry>,
    pub health: Arc<HealthTracker>,
    pub cache: Arc<TtlCache>,
    pub upstream: Arc<UpstreamClient>,
    pub resolver: Arc<StreamResolver>,
    pub proxy: Arc<MediaProxy>,
    pub catalog: Arc<CatalogService>,
    pub auth: Arc<AuthService>,
    pub lyrics_client: reqwest::Client,
    /// Per-subject in-memory history for the `/history` route; no
    /// persistent user storage backs this.
    pub history: Arc<DashMap<String, Vec<Value>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(InstanceRegistry::new(&config));
        let health = Arc::new(HealthTracker::new());
        let cache = Arc::new(TtlCache::new());
        let upstream = Arc::new(UpstreamClient::new(registry.clone(), health.clone()));
        let resolver = Arc::new(StreamResolver::new(upstream.clone(), cache.clone()));
        let proxy = Arc::new(MediaProxy::new(resolver.clone()));
        let catalog = Arc::new(CatalogService::new(upstream.clone(), cache.clone()));
        let auth = Arc::new(AuthService::new(&config.web.jwt_secret, config.web.jwt_expiration_secs));
        let lyrics_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(8))
            .user_agent(config.web.user_agent.clone())
            .build()
            .expect("failed to build lyrics http client");

        Self {
            config,
            registry,
            health,
            cache,
            upstream,
            resolver,
            proxy,
            catalog,
            auth,
            lyrics_client,
            history: Arc::new(DashMap::new()),
        }
    }
}

/// `authenticated` gate middleware: 401 if the bearer header
/// is absent, 403 if present but invalid/expired.
async fn authenticated(State(state): State<AppState>, headers: HeaderMap, request: Request<axum::body::Body>, next: Next) -> Response {
    let bearer = extract_bearer(headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()));
    match state.auth.resolve_authenticated(bearer) {
        Ok(_identity) => next.run(request).await,
        Err(err) => crate::errors::GatewayError::from(err).into_response(),
    }
}

pub fn build_router(state: AppState) -> Router {
    let reserved = Router::new()
        .route("/playlists/{*rest}", get(handlers::reserved::not_implemented).post(handlers::reserved::not_implemented))
        .route("/uploads/{*rest}", get(handlers::reserved::not_implemented).post(handlers::reserved::not_implemented))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticated));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/auth/login", post(handlers::auth::login))
        .route("/search", get(handlers::catalog::search))
        .route("/trending", get(handlers::catalog::trending))
        .route("/streams/{id}/best", get(handlers::streams::best))
        .route("/streams/{id}/proxy", get(handlers::streams::proxy))
        .route("/lyrics", get(handlers::lyrics::lyrics))
        .route("/history", get(handlers::history::list_history).post(handlers::history::record_history))
        .merge(reserved)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
