//! `GET /lyrics`: proxies `api.lyrics.ovh`.

use crate::web::AppState;
use crate::web::responses::LyricsResponse;
use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct LyricsParams {
    pub title: String,
    pub artist: String,
}

#[derive(Debug, Deserialize)]
struct LyricsOvhResponse {
    lyrics: Option<String>,
}

pub async fn lyrics(State(state): State<AppState>, Query(params): Query<LyricsParams>) -> Json<LyricsResponse> {
    let url = format!(
        "https://api.lyrics.ovh/v1/{}/{}",
        urlencoding::encode(&params.artist),
        urlencoding::encode(&params.title),
    );

    let lyrics = fetch_lyrics(&state, &url).await;
    Json(LyricsResponse { lyrics })
}

async fn fetch_lyrics(state: &AppState, url: &str) -> Option<String> {
    let response = state.lyrics_client.get(url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    match response.json::<LyricsOvhResponse>().await {
        Ok(body) => body.lyrics,
        Err(e) => {
            warn!(error = %e, "lyrics.ovh response decode failed");
            None
        }
    }
}
