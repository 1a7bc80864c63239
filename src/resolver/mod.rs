//! Stream Resolver.
//!
//! Reconciles the two incompatible upstream schemas (piped, invidious) into a
//! single `ResolvedStream`, trying one service kind and falling back to the
//! other. Normalization is split into `piped` and `invidious` submodules
//! rather than unified at the parser level.

pub mod invidious;
pub mod piped;

use crate::cache::TtlCache;
use crate::errors::{ResolveError, ResolveResult};
use crate::models::{AudioVariant, ResolvedStream, ServiceKind, VideoVariant};
use crate::upstream::{FetchOpts, UpstreamClient};
use std::sync::Arc;
use tracing::debug;

/// Fresh-cache and per-service-cache TTL.
const RESOLVE_TTL_MS: u64 = 5 * 60 * 1000;

pub struct StreamResolver {
    client: Arc<UpstreamClient>,
    cache: Arc<TtlCache>,
}

impl StreamResolver {
    pub fn new(client: Arc<UpstreamClient>, cache: Arc<TtlCache>) -> Self {
        Self { client, cache }
    }

    fn resolved_cache_key(video_id: &str) -> String {
        TtlCache::namespaced_key("resolved", video_id)
    }

    fn raw_cache_key(kind: ServiceKind, video_id: &str) -> String {
        TtlCache::namespaced_key(kind.as_str(), video_id)
    }

    /// Drops the resolved-stream cache entry and the underlying per-service
    /// raw-response caches for `video_id`, so the next resolve re-fetches
    /// fresh upstream data instead of returning a now-dead URL.
    pub fn invalidate(&self, video_id: &str) {
        self.cache.delete(&Self::resolved_cache_key(video_id));
        self.cache.delete(&Self::raw_cache_key(ServiceKind::Piped, video_id));
        self.cache.delete(&Self::raw_cache_key(ServiceKind::Invidious, video_id));
    }

    pub async fn resolve(
        &self,
        video_id: &str,
        preferred_source: Option<ServiceKind>,
        preferred_instance: Option<String>,
    ) -> ResolveResult<ResolvedStream> {
        let resolved_key = Self::resolved_cache_key(video_id);
        if let Some(cached) = self.cache.get::<ResolvedStream>(&resolved_key) {
            return Ok(cached);
        }

        let first = match preferred_source {
            Some(ServiceKind::Invidious) => ServiceKind::Invidious,
            _ => ServiceKind::Piped,
        };
        let second = first.other().unwrap_or(ServiceKind::Invidious);

        for kind in [first, second] {
            let attempted = if kind == first {
                preferred_instance.clone()
            } else {
                None
            };
            if let Some(stream) = self.try_kind(kind, video_id, attempted).await {
                self.cache.set(&resolved_key, &stream, RESOLVE_TTL_MS);
                return Ok(stream);
            }
        }

        Err(ResolveError::Unavailable { video_id: video_id.to_string() })
    }

    async fn try_kind(&self, kind: ServiceKind, video_id: &str, preferred_instance: Option<String>) -> Option<ResolvedStream> {
        match kind {
            ServiceKind::Piped => self.try_piped(video_id, preferred_instance).await,
            ServiceKind::Invidious => self.try_invidious(video_id, preferred_instance).await,
            _ => None,
        }
    }

    async fn try_piped(&self, video_id: &str, preferred_instance: Option<String>) -> Option<ResolvedStream> {
        let opts = FetchOpts::json().with_preferred_instance(preferred_instance);
        let raw = self
            .client
            .fetch_raw(ServiceKind::Piped, |base| format!("{base}/streams/{video_id}"), &opts)
            .await
            .inspect_err(|e| debug!(error = %e, "piped resolve failed"))
            .ok()?;

        let body = String::from_utf8_lossy(&raw.body);
        let content_type = raw
            .headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let parsed: piped::PipedResponse = if content_type.contains("json") {
            serde_json::from_str(&body).ok()?
        } else {
            let blob = piped::extract_next_data(&body)?;
            serde_json::from_str(blob).ok()?
        };

        let audio_ladder = sort_audio_ladder(piped::to_audio_ladder(&parsed));
        if audio_ladder.is_empty() {
            return None;
        }
        let video_ladder = sort_video_ladder(piped::to_video_ladder(&parsed));

        let head = &audio_ladder[0];
        let stream = ResolvedStream {
            audio_url: head.url.clone(),
            manifest_url: parsed.hls.clone(),
            mime_type: head.mime_type.clone(),
            audio_ladder,
            video_ladder,
            source: ServiceKind::Piped,
            instance: raw.instance.base_url.clone(),
        };

        self.cache.set(
            &Self::raw_cache_key(ServiceKind::Piped, video_id),
            &raw.instance.base_url,
            RESOLVE_TTL_MS,
        );
        Some(stream)
    }

    async fn try_invidious(&self, video_id: &str, preferred_instance: Option<String>) -> Option<ResolvedStream> {
        let opts = FetchOpts::json().with_preferred_instance(preferred_instance);
        let raw = self
            .client
            .fetch_raw(ServiceKind::Invidious, |base| format!("{base}/api/v1/videos/{video_id}"), &opts)
            .await
            .inspect_err(|e| debug!(error = %e, "invidious resolve failed"))
            .ok()?;

        let parsed: invidious::InvidiousResponse = serde_json::from_slice(&raw.body).ok()?;
        let instance_base = raw.instance.base_url.as_str();

        let audio_ladder = sort_audio_ladder(invidious::to_audio_ladder(&parsed, instance_base, video_id));
        if audio_ladder.is_empty() {
            return None;
        }
        let video_ladder = sort_video_ladder(invidious::to_video_ladder(&parsed, instance_base, video_id));

        let head = &audio_ladder[0];
        let stream = ResolvedStream {
            audio_url: head.url.clone(),
            manifest_url: None,
            mime_type: head.mime_type.clone(),
            audio_ladder,
            video_ladder,
            source: ServiceKind::Invidious,
            instance: instance_base.to_string(),
        };

        self.cache.set(
            &Self::raw_cache_key(ServiceKind::Invidious, video_id),
            &instance_base.to_string(),
            RESOLVE_TTL_MS,
        );
        Some(stream)
    }
}

fn codec_rank(codec: &str) -> u8 {
    match codec.to_ascii_lowercase().as_str() {
        c if c.contains("opus") => 0,
        c if c.contains("aac") || c.contains("mp4a") => 1,
        _ => 2,
    }
}

/// Sorts by codec preference then descending bitrate (URL-less variants are
/// already dropped by normalization).
fn sort_audio_ladder(mut ladder: Vec<AudioVariant>) -> Vec<AudioVariant> {
    ladder.sort_by(|a, b| {
        codec_rank(&a.codec)
            .cmp(&codec_rank(&b.codec))
            .then_with(|| b.bitrate.cmp(&a.bitrate))
    });
    ladder
}

/// Sorts by descending height (unknown heights sink last).
fn sort_video_ladder(mut ladder: Vec<VideoVariant>) -> Vec<VideoVariant> {
    ladder.sort_by(|a, b| b.height.unwrap_or(0).cmp(&a.height.unwrap_or(0)));
    ladder
}

/// itag→label fallback table for when height is unknown.
fn itag_quality_label(itag: u32) -> Option<&'static str> {
    match itag {
        37 | 137 | 299 => Some("1080p"),
        22 | 136 | 298 => Some("720p"),
        135 => Some("480p"),
        134 => Some("360p"),
        133 => Some("240p"),
        160 => Some("144p"),
        _ => None,
    }
}

/// Height→label thresholds, falling back to the static itag table when
/// height is unknown.
pub(crate) fn quality_label_for_height(height: Option<u32>, itag: Option<u32>) -> String {
    if let Some(height) = height {
        let label = if height >= 4320 {
            "4320p(8K)"
        } else if height >= 2160 {
            "2160p(4K)"
        } else if height >= 1440 {
            "1440p(2K)"
        } else if height >= 1080 {
            "1080p"
        } else if height >= 720 {
            "720p"
        } else if height >= 480 {
            "480p"
        } else if height >= 360 {
            "360p"
        } else if height >= 240 {
            "240p"
        } else {
            "144p"
        };
        return label.to_string();
    }

    itag.and_then(itag_quality_label).unwrap_or("unknown").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_preference_orders_opus_before_aac_before_other() {
        let ladder = vec![
            AudioVariant { url: "u1".into(), bitrate: 128_000, codec: "mp4a.40.2".into(), mime_type: "audio/mp4".into(), content_length: None },
            AudioVariant { url: "u2".into(), bitrate: 96_000, codec: "opus".into(), mime_type: "audio/webm".into(), content_length: None },
            AudioVariant { url: "u3".into(), bitrate: 160_000, codec: "opus".into(), mime_type: "audio/webm".into(), content_length: None },
        ];
        let sorted = sort_audio_ladder(ladder);
        assert_eq!(sorted[0].url, "u3");
        assert_eq!(sorted[1].url, "u2");
        assert_eq!(sorted[2].url, "u1");
    }

    #[test]
    fn height_thresholds_match_spec_table() {
        assert_eq!(quality_label_for_height(Some(2160), None), "2160p(4K)");
        assert_eq!(quality_label_for_height(Some(1079), None), "720p");
        assert_eq!(quality_label_for_height(Some(100), None), "144p");
    }

    #[test]
    fn unknown_height_falls_back_to_itag_table() {
        assert_eq!(quality_label_for_height(None, Some(22)), "720p");
        assert_eq!(quality_label_for_height(None, Some(999_999)), "unknown");
    }

    #[test]
    fn next_data_blob_is_extracted_between_script_tags() {
        let html = r#"<html><script id="__NEXT_DATA__" type="application/json">{"audioStreams":[]}</script></html>"#;
        let blob = piped::extract_next_data(html).unwrap();
        assert_eq!(blob, r#"{"audioStreams":[]}"#);
    }
}
