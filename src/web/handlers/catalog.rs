//! `GET /search` and `GET /trending`.

use crate::auth::extract_bearer;
use crate::errors::GatewayResult;
use crate::models::Track;
use crate::web::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub region: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
) -> GatewayResult<Json<Vec<Track>>> {
    let bearer = extract_bearer(headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()));
    state.auth.resolve_guest_ok(bearer)?;

    let region = params.region.unwrap_or_else(|| state.config.resolve_music_region());
    let tracks = state.catalog.search(&params.q, &region).await?;
    Ok(Json(tracks))
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    pub region: Option<String>,
}

pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingParams>,
    headers: HeaderMap,
) -> GatewayResult<Json<Vec<Track>>> {
    let bearer = extract_bearer(headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()));
    state.auth.resolve_guest_ok(bearer)?;

    let region = params.region.unwrap_or_else(|| state.config.resolve_music_region());
    let tracks = state.catalog.trending(&region).await?;
    Ok(Json(tracks))
}
