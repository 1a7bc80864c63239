//! Catalog endpoints: search and trending, merging and deduplicating
//! results from both service kinds behind the music classifier.

pub mod classifier;

use crate::cache::TtlCache;
use crate::errors::{GatewayError, GatewayResult};
use crate::models::{ServiceKind, Track};
use crate::upstream::{FetchOpts, UpstreamClient};
use classifier::{ClassifyInput, is_music};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

const SEARCH_LIMIT: usize = 60;
const TRENDING_LIMIT: usize = 40;
const PIPED_SEARCH_TTL_MS: u64 = 30_000;
const INVIDIOUS_SEARCH_TTL_MS: u64 = 45_000;
const TRENDING_TTL_MS: u64 = 10 * 60 * 1000;

/// Weighted fallback seed queries for trending when both upstream trending
/// endpoints return fewer than [`TRENDING_LIMIT`] items.
const SEED_QUERIES: &[(&str, f64)] = &[
    ("official audio", 1.0),
    ("new music 2026", 0.97),
    ("top songs", 0.94),
    ("official music video", 0.92),
    ("lyrics video", 0.90),
    ("acoustic cover", 0.88),
    ("remix", 0.87),
    ("album mix", 0.86),
];

#[derive(Debug, Deserialize)]
struct PipedSearchResponse {
    #[serde(default)]
    items: Vec<PipedItem>,
}

#[derive(Debug, Deserialize)]
struct PipedItem {
    url: Option<String>,
    title: Option<String>,
    #[serde(rename = "uploaderName", default)]
    uploader_name: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    duration: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvidiousItem {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
    title: Option<String>,
    author: Option<String>,
    #[serde(rename = "lengthSeconds", default)]
    length_seconds: Option<u32>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "videoThumbnails", default)]
    video_thumbnails: Vec<InvidiousThumbnail>,
}

#[derive(Debug, Deserialize)]
struct InvidiousThumbnail {
    url: Option<String>,
}

fn piped_video_id(url: &str) -> Option<String> {
    url.split("v=").nth(1).map(|s| s.split('&').next().unwrap_or(s).to_string())
}

fn piped_to_track(item: PipedItem, instance: &str) -> Option<Track> {
    let id = piped_video_id(item.url.as_deref()?)?;
    let mut track = Track::youtube(id, item.title.unwrap_or_default(), item.uploader_name.unwrap_or_default());
    track.thumbnail = item.thumbnail;
    track.duration_s = item.duration.filter(|d| *d >= 0).map(|d| d as u32);
    track.stream_source = Some(ServiceKind::Piped);
    track.stream_instance = Some(instance.to_string());
    Some(track)
}

fn invidious_to_track(item: InvidiousItem, instance: &str) -> Option<Track> {
    let id = item.video_id?;
    let mut track = Track::youtube(id, item.title.unwrap_or_default(), item.author.unwrap_or_default());
    track.thumbnail = item.video_thumbnails.into_iter().find_map(|t| t.url);
    track.duration_s = item.length_seconds;
    track.stream_source = Some(ServiceKind::Invidious);
    track.stream_instance = Some(instance.to_string());
    Some(track)
}

pub struct CatalogService {
    client: Arc<UpstreamClient>,
    cache: Arc<TtlCache>,
}

impl CatalogService {
    pub fn new(client: Arc<UpstreamClient>, cache: Arc<TtlCache>) -> Self {
        Self { client, cache }
    }

    /// `GET /search`: piped-first, invidious appended, deduplicated by id,
    /// truncated to 60.
    pub async fn search(&self, query: &str, region: &str) -> GatewayResult<Vec<Track>> {
        let piped_key = TtlCache::namespaced_key("search-piped", &format!("{query}:{region}"));
        let invidious_key = TtlCache::namespaced_key("search-invidious", &format!("{query}:{region}"));

        let (piped_result, invidious_result) = tokio::join!(
            self.fetch_piped_search(query, region, &piped_key),
            self.fetch_invidious_search(query, region, &invidious_key),
        );

        if piped_result.is_none() && invidious_result.is_none() {
            return Err(GatewayError::internal("search unavailable: both piped and invidious failed"));
        }

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for track in piped_result.into_iter().flatten().chain(invidious_result.into_iter().flatten()) {
            if seen.insert(track.id.clone()) {
                merged.push(track);
            }
            if merged.len() >= SEARCH_LIMIT {
                break;
            }
        }
        Ok(merged)
    }

    async fn fetch_piped_search(&self, query: &str, region: &str, cache_key: &str) -> Option<Vec<Track>> {
        if let Some(cached) = self.cache.get::<Vec<Track>>(cache_key) {
            return Some(cached);
        }
        let opts = FetchOpts::json();
        let raw = self
            .client
            .fetch_raw(
                ServiceKind::Piped,
                |base| format!("{base}/search?q={}&region={}&filter=music_songs", urlencoding::encode(query), region),
                &opts,
            )
            .await
            .inspect_err(|e| warn!(error = %e, "piped search failed"))
            .ok()?;

        let parsed: PipedSearchResponse = serde_json::from_slice(&raw.body).ok()?;
        let tracks: Vec<Track> = parsed
            .items
            .into_iter()
            .filter_map(|item| piped_to_track(item, &raw.instance.base_url))
            .collect();
        self.cache.set(cache_key, &tracks, PIPED_SEARCH_TTL_MS);
        Some(tracks)
    }

    async fn fetch_invidious_search(&self, query: &str, region: &str, cache_key: &str) -> Option<Vec<Track>> {
        if let Some(cached) = self.cache.get::<Vec<Track>>(cache_key) {
            return Some(cached);
        }
        let opts = FetchOpts::json();
        let raw = self
            .client
            .fetch_raw(
                ServiceKind::Invidious,
                |base| format!("{base}/api/v1/search?q={}&type=video&region={}", urlencoding::encode(query), region),
                &opts,
            )
            .await
            .inspect_err(|e| warn!(error = %e, "invidious search failed"))
            .ok()?;

        let parsed: Vec<InvidiousItem> = serde_json::from_slice(&raw.body).ok()?;
        let tracks: Vec<Track> = parsed
            .into_iter()
            .filter_map(|item| invidious_to_track(item, &raw.instance.base_url))
            .collect();
        self.cache.set(cache_key, &tracks, INVIDIOUS_SEARCH_TTL_MS);
        Some(tracks)
    }

    /// `GET /trending`: piped trending, invidious trending, falling back to
    /// weighted seed searches when short of 40 items, all filtered through
    /// the music classifier.
    pub async fn trending(&self, region: &str) -> GatewayResult<Vec<Track>> {
        let cache_key = TtlCache::namespaced_key("trending", region);
        if let Some(cached) = self.cache.get::<Vec<Track>>(&cache_key) {
            return Ok(cached);
        }

        let (piped_result, invidious_result) = tokio::join!(
            self.fetch_piped_trending(region),
            self.fetch_invidious_trending(region),
        );

        let mut seen = HashSet::new();
        let mut merged: Vec<Track> = Vec::new();
        for track in piped_result.into_iter().flatten().chain(invidious_result.into_iter().flatten()) {
            if classify_track(&track) && seen.insert(track.id.clone()) {
                merged.push(track);
            }
        }

        if merged.len() < TRENDING_LIMIT {
            let seed_results = self.fetch_seed_fallback(region).await;
            for (track, score) in seed_results {
                if classify_track(&track) && seen.insert(track.id.clone()) {
                    merged.push(track);
                    let _ = score;
                }
            }
        }

        merged.truncate(TRENDING_LIMIT);
        self.cache.set(&cache_key, &merged, TRENDING_TTL_MS);
        Ok(merged)
    }

    async fn fetch_piped_trending(&self, region: &str) -> Option<Vec<Track>> {
        let opts = FetchOpts::json();
        let raw = self
            .client
            .fetch_raw(ServiceKind::Piped, |base| format!("{base}/trending?region={region}&type=music"), &opts)
            .await
            .inspect_err(|e| warn!(error = %e, "piped trending failed"))
            .ok()?;
        let items: Vec<PipedItem> = serde_json::from_slice(&raw.body).ok()?;
        Some(items.into_iter().filter_map(|item| piped_to_track(item, &raw.instance.base_url)).collect())
    }

    async fn fetch_invidious_trending(&self, region: &str) -> Option<Vec<Track>> {
        let opts = FetchOpts::json();
        let raw = self
            .client
            .fetch_raw(ServiceKind::Invidious, |base| format!("{base}/api/v1/trending?type=music&region={region}"), &opts)
            .await
            .inspect_err(|e| warn!(error = %e, "invidious trending failed"))
            .ok()?;
        let items: Vec<InvidiousItem> = serde_json::from_slice(&raw.body).ok()?;
        Some(items.into_iter().filter_map(|item| invidious_to_track(item, &raw.instance.base_url)).collect())
    }

    /// Parallel weighted invidious searches over [`SEED_QUERIES`], scoring
    /// each item `weight - 0.01 * index`.
    async fn fetch_seed_fallback(&self, region: &str) -> Vec<(Track, f64)> {
        let futures = SEED_QUERIES.iter().map(|(query, weight)| async move {
            let key = TtlCache::namespaced_key("search-invidious", &format!("{query}:{region}"));
            let tracks = self.fetch_invidious_search(query, region, &key).await.unwrap_or_default();
            tracks
                .into_iter()
                .enumerate()
                .map(|(index, track)| (track, weight - 0.01 * index as f64))
                .collect::<Vec<_>>()
        });

        let mut scored: Vec<(Track, f64)> = futures::future::join_all(futures).await.into_iter().flatten().collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}

/// Track doesn't carry the raw description catalog items arrived with, so
/// classification here runs over title/uploader/duration only; the
/// description-length and keyword checks still apply to the fields we have.
fn classify_track(track: &Track) -> bool {
    is_music(&ClassifyInput {
        title: &track.title,
        description: "",
        uploader: &track.artist,
        duration_s: track.duration_s,
    })
}
