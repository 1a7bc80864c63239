//! `GET /streams/{id}/best` and `GET /streams/{id}/proxy`.

use crate::auth::extract_bearer;
use crate::errors::GatewayResult;
use crate::models::ServiceKind;
use crate::web::AppState;
use crate::web::responses::{BestStreamResponse, build_proxied_url};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct BestParams {
    pub source: Option<String>,
    pub instance: Option<String>,
}

/// `GET /streams/{id}/best`. This route is nominally `guest-ok`-gated, but
/// the `guest-token` literal only identifies the caller rather than
/// authorizing them, so the gate check below is identification only.
pub async fn best(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(params): Query<BestParams>,
    headers: HeaderMap,
) -> GatewayResult<Json<BestStreamResponse>> {
    let bearer = extract_bearer(headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()));
    state.auth.resolve_guest_ok(bearer)?;

    let preferred_source = params.source.as_deref().and_then(|s| ServiceKind::from_str(s).ok());
    let stream = state.resolver.resolve(&video_id, preferred_source, params.instance).await?;

    let proxied_url = build_proxied_url(&video_id, &stream.audio_url, stream.source, &stream.instance);
    Ok(Json(BestStreamResponse {
        url: stream.audio_url,
        proxied_url,
        manifest_url: stream.manifest_url,
        mime_type: Some(stream.mime_type),
        origin: stream.source,
        instance: Some(stream.instance),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub src: String,
    pub source: Option<String>,
    pub instance: Option<String>,
}

/// `GET /streams/{id}/proxy`. Streams bytes; never returns JSON on success.
pub async fn proxy(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(params): Query<ProxyParams>,
    headers: HeaderMap,
) -> GatewayResult<Response> {
    let bearer = extract_bearer(headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()));
    state.auth.resolve_guest_ok(bearer)?;

    let source = params
        .source
        .as_deref()
        .and_then(|s| ServiceKind::from_str(s).ok())
        .unwrap_or(ServiceKind::Piped);
    let range = headers.get(axum::http::header::RANGE).and_then(|v| v.to_str().ok()).map(str::to_string);

    let response = state
        .proxy
        .proxy(&video_id, &params.src, source, params.instance, range)
        .await?;
    Ok(response)
}
