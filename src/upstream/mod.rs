//! Upstream Client: ranked-iteration fetcher.
//!
//! Tries instances of a service kind in Health Tracker rank order, records
//! the outcome of each attempt, and returns the first success. Bounded by a
//! single deadline covering the whole candidate sequence, since catalog and
//! resolve calls must bound their total tail latency.

use crate::errors::{UpstreamError, UpstreamResult};
use crate::health::HealthTracker;
use crate::models::{Instance, ServiceKind};
use crate::registry::InstanceRegistry;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Global deadline covering the full ranked-attempt sequence.
pub const FETCH_DEADLINE: Duration = Duration::from_secs(12);

#[derive(Debug, Clone)]
pub struct FetchOpts {
    pub accept: Option<&'static str>,
    /// When true (the default), a non-2xx status is treated as a failure and
    /// the client moves on to the next candidate instance.
    pub strict_status: bool,
    /// Promotes this base URL to the head of the ranked candidate list for
    /// this call only; it does not mutate the registry or health state.
    pub preferred_instance: Option<String>,
}

impl FetchOpts {
    pub fn json() -> Self {
        Self {
            accept: Some("application/json"),
            strict_status: true,
            preferred_instance: None,
        }
    }

    pub fn with_preferred_instance(mut self, instance: Option<String>) -> Self {
        self.preferred_instance = instance;
        self
    }
}

/// Moves the candidate matching `preferred` (if any) to the front, preserving
/// the relative order of everything else.
fn promote(mut ranked: Vec<crate::health::RankedInstance>, preferred: Option<&str>) -> Vec<crate::health::RankedInstance> {
    let Some(preferred) = preferred else { return ranked };
    if let Some(pos) = ranked.iter().position(|r| r.instance.base_url == preferred) {
        let promoted = ranked.remove(pos);
        ranked.insert(0, promoted);
    }
    ranked
}

pub struct RawResponse {
    pub status: reqwest::StatusCode,
    pub headers: reqwest::header::HeaderMap,
    pub body: bytes::Bytes,
    pub instance: Instance,
}

pub struct UpstreamClient {
    http: Client,
    registry: Arc<InstanceRegistry>,
    health: Arc<HealthTracker>,
}

impl UpstreamClient {
    pub fn new(registry: Arc<InstanceRegistry>, health: Arc<HealthTracker>) -> Self {
        let http = Client::builder()
            .user_agent(format!("media-gateway/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build reqwest client");
        Self { http, registry, health }
    }

    /// Snapshots the ranking, iterates candidates under a single deadline,
    /// records success/failure per attempt, and returns the first success or
    /// an aggregate error.
    pub async fn fetch_raw(
        &self,
        kind: ServiceKind,
        build_url: impl Fn(&str) -> String,
        opts: &FetchOpts,
    ) -> UpstreamResult<RawResponse> {
        let instances = self.registry.instances(kind);
        if instances.is_empty() {
            return Err(UpstreamError::NoInstances { kind: kind.to_string() });
        }

        let ranked = promote(self.health.rank(&instances), opts.preferred_instance.as_deref());
        let deadline = Instant::now() + FETCH_DEADLINE;
        let mut reasons = Vec::new();

        for candidate in ranked {
            if Instant::now() >= deadline {
                reasons.push((candidate.instance.base_url.clone(), "deadline exceeded".to_string()));
                break;
            }

            let url = build_url(&candidate.instance.base_url);
            let mut request = self.http.get(&url);
            if let Some(accept) = opts.accept {
                request = request.header(reqwest::header::ACCEPT, accept);
            }

            let started = Instant::now();
            let result = request.send().await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if opts.strict_status && !status.is_success() {
                        warn!(url = %url, status = %status, "upstream instance returned non-2xx");
                        self.health.record_failure(kind, &candidate.instance.base_url);
                        reasons.push((candidate.instance.base_url.clone(), format!("HTTP {status}")));
                        continue;
                    }

                    let headers = response.headers().clone();
                    let body = match response.bytes().await {
                        Ok(b) => b,
                        Err(e) => {
                            self.health.record_failure(kind, &candidate.instance.base_url);
                            reasons.push((candidate.instance.base_url.clone(), format!("body read error: {e}")));
                            continue;
                        }
                    };

                    self.health.record_success(kind, &candidate.instance.base_url, elapsed_ms);
                    return Ok(RawResponse {
                        status,
                        headers,
                        body,
                        instance: candidate.instance,
                    });
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "upstream instance unreachable");
                    self.health.record_failure(kind, &candidate.instance.base_url);
                    reasons.push((candidate.instance.base_url.clone(), e.to_string()));
                }
            }
        }

        Err(UpstreamError::AllInstancesFailed { kind: kind.to_string(), reasons })
    }
}
