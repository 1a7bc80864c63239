//! Media proxy.
//!
//! Range-aware streaming proxy from an upstream media CDN to the client.
//! Classifies the early response (403, googlevideo text/plain mislabeling, or
//! a normal 2xx) and drives a bounded three-attempt retry ladder (A -> B -> C,
//! no recursion) when the upstream media URL has gone stale.

use crate::errors::{GatewayError, GatewayResult};
use crate::models::ServiceKind;
use crate::resolver::StreamResolver;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};
use url::Url;

/// Time-to-first-byte budget for a proxy attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MediaProxy {
    http: Client,
    resolver: Arc<StreamResolver>,
}

/// Outcome of classifying one attempt's early response.
enum Classified {
    /// Forward bytes as-is, optionally overriding the content-type.
    Stream { content_type_override: Option<&'static str> },
    /// Early failure: advance the retry ladder. `was_403` feeds the final
    /// error status when the whole ladder is exhausted.
    Retry { was_403: bool },
}

enum AttemptResult {
    Streamed(Response),
    Failed { was_403: bool },
}

impl MediaProxy {
    pub fn new(resolver: Arc<StreamResolver>) -> Self {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
            )
            .build()
            .expect("failed to build reqwest client");
        Self { http, resolver }
    }

    /// Drives the proxy request end to end: forwards bytes on success, runs
    /// the retry ladder on early failure, and returns the localized error
    /// envelope if all three attempts are exhausted.
    pub async fn proxy(
        &self,
        video_id: &str,
        src: &str,
        source: ServiceKind,
        instance: Option<String>,
        range: Option<String>,
    ) -> GatewayResult<Response> {
        let mut last_403 = false;

        // Attempt A: the provided src.
        match self.run_attempt(src, range.clone()).await {
            AttemptResult::Streamed(response) => return Ok(response),
            AttemptResult::Failed { was_403 } => last_403 = was_403,
        }

        // Attempt B: re-resolve against the same source.
        self.resolver.invalidate(video_id);
        if let Ok(stream) = self.resolver.resolve(video_id, Some(source), instance).await {
            if stream.audio_url != src {
                match self.run_attempt(&stream.audio_url, range.clone()).await {
                    AttemptResult::Streamed(response) => return Ok(response),
                    AttemptResult::Failed { was_403 } => last_403 = was_403,
                }
            }
        }

        // Attempt C: re-resolve against the other service kind.
        let other = source.other().unwrap_or(source);
        self.resolver.invalidate(video_id);
        if let Ok(stream) = self.resolver.resolve(video_id, Some(other), None).await {
            match self.run_attempt(&stream.audio_url, range.clone()).await {
                AttemptResult::Streamed(response) => return Ok(response),
                AttemptResult::Failed { was_403 } => last_403 = was_403,
            }
        }

        error!(video_id, "retry ladder exhausted");
        Err(GatewayError::StreamDenied {
            localized: "Unable to load stream. Try a VPN or change your region.".to_string(),
            last_403,
        })
    }

    /// Runs a single attempt of the ladder.
    async fn run_attempt(&self, src: &str, range: Option<String>) -> AttemptResult {
        let mut request = self
            .http
            .get(src)
            .header(
                reqwest::header::ACCEPT,
                "audio/webm,audio/ogg,audio/*;q=0.9,application/ogg;q=0.7,video/*;q=0.6,*/*;q=0.5",
            )
            .header(reqwest::header::REFERER, "https://www.youtube.com/")
            .header(reqwest::header::ORIGIN, "https://www.youtube.com");

        if let Some(range) = &range {
            request = request.header(reqwest::header::RANGE, range.clone());
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(src, error = %e, "proxy attempt failed to connect");
                return AttemptResult::Failed { was_403: false };
            }
        };

        match classify(&response, src) {
            Classified::Retry { was_403 } => {
                if was_403 {
                    warn!(src, "upstream returned 403, advancing retry ladder");
                }
                AttemptResult::Failed { was_403 }
            }
            Classified::Stream { content_type_override } => {
                AttemptResult::Streamed(self.stream_response(response, content_type_override))
            }
        }
    }

    fn stream_response(&self, response: reqwest::Response, content_type_override: Option<&'static str>) -> Response {
        let status = response.status();
        let upstream_headers = response.headers().clone();

        let mut headers = HeaderMap::new();
        copy_header(&upstream_headers, &mut headers, reqwest::header::CONTENT_LENGTH);
        copy_header(&upstream_headers, &mut headers, reqwest::header::ACCEPT_RANGES);
        copy_header(&upstream_headers, &mut headers, reqwest::header::CONTENT_RANGE);
        copy_header(&upstream_headers, &mut headers, reqwest::header::ETAG);
        copy_header(&upstream_headers, &mut headers, reqwest::header::LAST_MODIFIED);
        copy_header(&upstream_headers, &mut headers, reqwest::header::CACHE_CONTROL);

        let content_type = content_type_override.map(str::to_string).or_else(|| {
            upstream_headers
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        });
        if let Some(content_type) = content_type {
            if let Ok(value) = HeaderValue::from_str(&content_type) {
                headers.insert(reqwest::header::CONTENT_TYPE, value);
            }
        }

        headers.insert(
            HeaderName::from_static("access-control-allow-origin"),
            HeaderValue::from_static("*"),
        );
        headers.insert(
            HeaderName::from_static("access-control-expose-headers"),
            HeaderValue::from_static("Content-Range, Accept-Ranges, Content-Length"),
        );
        headers.insert(
            HeaderName::from_static("access-control-allow-headers"),
            HeaderValue::from_static("Range"),
        );

        let status_code = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::OK);
        let byte_stream = response.bytes_stream().map(|chunk| chunk.map_err(std::io::Error::other));
        let body = Body::from_stream(byte_stream);

        (status_code, headers, body).into_response()
    }
}

fn copy_header(from: &reqwest::header::HeaderMap, to: &mut HeaderMap, name: reqwest::header::HeaderName) {
    if let Some(value) = from.get(&name) {
        if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
            to.insert(name, value);
        }
    }
}

/// Classifies the early response. Takes the response by
/// reference so the caller still owns it for streaming on the success path.
fn classify(response: &reqwest::Response, src: &str) -> Classified {
    let status = response.status();

    if status == StatusCode::FORBIDDEN {
        return Classified::Retry { was_403: true };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let host_is_googlevideo = Url::parse(src)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .map(|h| h.contains("googlevideo.com"))
        .unwrap_or(false);

    if status == StatusCode::OK && content_type.contains("text/plain") && host_is_googlevideo {
        let itag = Url::parse(src)
            .ok()
            .and_then(|u| u.query_pairs().find(|(k, _)| k == "itag").map(|(_, v)| v.to_string()))
            .and_then(|s| s.parse::<u32>().ok());
        return Classified::Stream { content_type_override: Some(mime_for_itag(itag)) };
    }

    if status.is_success() {
        return Classified::Stream { content_type_override: None };
    }

    Classified::Retry { was_403: false }
}

/// itag -> MIME override table.
fn mime_for_itag(itag: Option<u32>) -> &'static str {
    match itag {
        Some(140 | 141 | 256 | 258 | 325 | 328) => "audio/mp4",
        Some(249 | 250 | 251 | 171 | 172) => "audio/webm",
        _ => "audio/webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_table_maps_mp4_itags() {
        assert_eq!(mime_for_itag(Some(140)), "audio/mp4");
        assert_eq!(mime_for_itag(Some(251)), "audio/webm");
        assert_eq!(mime_for_itag(Some(999)), "audio/webm");
        assert_eq!(mime_for_itag(None), "audio/webm");
    }
}
