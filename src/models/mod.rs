//! Core data model shared across the gateway.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Latency sentinel used when an instance has never succeeded, or has been
/// demoted after saturating its failure streak.
pub const INFINITE_LATENCY_MS: u64 = u64::MAX;

/// The service kind an [`Instance`] implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Piped,
    Invidious,
    Hyperpipe,
    Hls,
    Proxy,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Piped => "piped",
            ServiceKind::Invidious => "invidious",
            ServiceKind::Hyperpipe => "hyperpipe",
            ServiceKind::Hls => "hls",
            ServiceKind::Proxy => "proxy",
        }
    }

    pub fn other(&self) -> Option<ServiceKind> {
        match self {
            ServiceKind::Piped => Some(ServiceKind::Invidious),
            ServiceKind::Invidious => Some(ServiceKind::Piped),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "piped" => Ok(ServiceKind::Piped),
            "invidious" => Ok(ServiceKind::Invidious),
            "hyperpipe" => Ok(ServiceKind::Hyperpipe),
            "hls" => Ok(ServiceKind::Hls),
            "proxy" => Ok(ServiceKind::Proxy),
            other => Err(format!("unknown service kind: {other}")),
        }
    }
}

/// A single upstream instance: a normalized base URL under a service kind.
/// Invariant: URLs are unique within a kind (enforced by the registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub kind: ServiceKind,
    pub base_url: String,
}

impl Instance {
    pub fn new(kind: ServiceKind, raw_url: &str) -> Self {
        Self {
            kind,
            base_url: normalize_base_url(raw_url),
        }
    }
}

/// Strip trailing slashes.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Per-instance health state, owned by the Health Tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthState {
    pub latency_ms: u64,
    pub failure_streak: u8,
    pub last_failure_ts: Option<u64>,
    pub last_success_ts: Option<u64>,
    /// Monotonic tiebreaker preserving insertion order for deterministic ranking.
    pub sequence: u64,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            latency_ms: INFINITE_LATENCY_MS,
            failure_streak: 0,
            last_failure_ts: None,
            last_success_ts: None,
            sequence: 0,
        }
    }
}

/// A single audio variant in a [`ResolvedStream`]'s ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioVariant {
    pub url: String,
    pub bitrate: u64,
    pub codec: String,
    pub mime_type: String,
    pub content_length: Option<u64>,
}

/// A single video variant in a [`ResolvedStream`]'s ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoVariant {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub fps: Option<u32>,
    pub itag: Option<u32>,
    pub bitrate: Option<u64>,
    pub codec: Option<String>,
    pub quality_label: String,
}

/// Output of the Stream Resolver. Invariant: `audio_ladder` is
/// never empty — an empty ladder resolves to "unavailable" instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedStream {
    pub audio_url: String,
    pub manifest_url: Option<String>,
    pub mime_type: String,
    pub audio_ladder: Vec<AudioVariant>,
    pub video_ladder: Vec<VideoVariant>,
    pub source: ServiceKind,
    /// Base URL of the instance that produced this result, carried forward so
    /// `/streams/{id}/best` can report it and a later proxy retry can prefer
    /// it again.
    pub instance: String,
}

/// Catalog track shape returned by `/search` and `/trending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub duration_s: Option<u32>,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_source: Option<ServiceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_instance: Option<String>,
}

impl Track {
    pub fn youtube(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            thumbnail: None,
            duration_s: None,
            source: "youtube",
            stream_source: None,
            stream_instance: None,
        }
    }
}

/// A cached value with an expiry timestamp.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub expires_at: u64,
    pub value: T,
}
