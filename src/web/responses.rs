//! Shared response shapes for the HTTP surface.

use crate::models::ServiceKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BestStreamResponse {
    pub url: String,
    #[serde(rename = "proxiedUrl")]
    pub proxied_url: String,
    #[serde(rename = "manifestUrl", skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub origin: ServiceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LyricsResponse {
    pub lyrics: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Builds the self-referencing `proxiedUrl`: clients never
/// contact the upstream CDN directly.
pub fn build_proxied_url(video_id: &str, src: &str, source: ServiceKind, instance: &str) -> String {
    format!(
        "/streams/{video_id}/proxy?src={}&source={}&instance={}",
        urlencoding::encode(src),
        source,
        urlencoding::encode(instance),
    )
}
