//! `GET /history`, `POST /history`: guest-ok, empty/no-op for
//! guests since this repo owns no persistent user storage.

use crate::auth::{Identity, extract_bearer};
use crate::errors::GatewayResult;
use crate::web::AppState;
use crate::web::responses::MessageResponse;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

fn identify(state: &AppState, headers: &HeaderMap) -> GatewayResult<Identity> {
    let bearer = extract_bearer(headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()));
    Ok(state.auth.resolve_guest_ok(bearer)?)
}

pub async fn record_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut record): Json<Value>,
) -> GatewayResult<Response> {
    match identify(&state, &headers)? {
        Identity::Guest => Ok(Json(MessageResponse { message: "history is not recorded for guests".to_string() }).into_response()),
        Identity::User { subject, .. } => {
            if let Value::Object(ref mut map) = record {
                map.insert("entryId".to_string(), json!(Uuid::new_v4().to_string()));
            }
            state.history.entry(subject).or_default().push(record.clone());
            Ok(Json(record).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn list_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> GatewayResult<Json<Vec<Value>>> {
    match identify(&state, &headers)? {
        Identity::Guest => Ok(Json(Vec::new())),
        Identity::User { subject, .. } => {
            let records = state.history.get(&subject).map(|r| r.clone()).unwrap_or_default();
            let limit = query.limit.unwrap_or(records.len());
            Ok(Json(records.into_iter().rev().take(limit).collect()))
        }
    }
}
