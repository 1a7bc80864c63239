//! Health Tracker.
//!
//! Per-instance state keyed by `(kind, url)`, mutated independently with no
//! reference cycles. Each key gets its own shard lock, so ranking one kind
//! never contends with a concurrent mutation of another instance's state.

use crate::models::{HealthState, INFINITE_LATENCY_MS, Instance, ServiceKind, now_ms};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

const MAX_FAILURE_STREAK: u8 = 3;

#[derive(Debug, Clone)]
pub struct RankedInstance {
    pub instance: Instance,
    pub health: HealthState,
}

pub struct HealthTracker {
    states: DashMap<(ServiceKind, String), HealthState>,
    sequence: AtomicU64,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Resets the failure streak, records the observed latency, and stamps a
    /// success timestamp.
    pub fn record_success(&self, kind: ServiceKind, url: &str, latency_ms: u64) {
        let seq = self.next_sequence();
        let mut entry = self.states.entry((kind, url.to_string())).or_default();
        entry.failure_streak = 0;
        entry.latency_ms = latency_ms;
        entry.last_success_ts = Some(now_ms());
        entry.sequence = seq;
    }

    /// Increments the failure streak (saturating at 3); on reaching the cap,
    /// demotes `latency_ms` to the infinite sentinel so ranking sinks the
    /// instance to the bottom.
    pub fn record_failure(&self, kind: ServiceKind, url: &str) {
        let seq = self.next_sequence();
        let mut entry = self.states.entry((kind, url.to_string())).or_default();
        entry.failure_streak = (entry.failure_streak + 1).min(MAX_FAILURE_STREAK);
        if entry.failure_streak >= MAX_FAILURE_STREAK {
            entry.latency_ms = INFINITE_LATENCY_MS;
        }
        entry.last_failure_ts = Some(now_ms());
        entry.sequence = seq;
    }

    pub fn health_of(&self, kind: ServiceKind, url: &str) -> HealthState {
        self.states
            .get(&(kind, url.to_string()))
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Ranks `instances` by: (1) ascending `failure_streak`, (2) ascending
    /// `latency_ms`, (3) descending `last_success_ts`, ties broken by
    /// insertion order. Unknown instances (never observed)
    /// default to zero failures / infinite latency, sorting after any
    /// instance with a recorded success but before demoted instances of
    /// equal failure streak — consistent with "no eviction, still eligible".
    pub fn rank(&self, instances: &[Instance]) -> Vec<RankedInstance> {
        let mut ranked: Vec<RankedInstance> = instances
            .iter()
            .map(|instance| RankedInstance {
                instance: instance.clone(),
                health: self.health_of(instance.kind, &instance.base_url),
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.health
                .failure_streak
                .cmp(&b.health.failure_streak)
                .then_with(|| a.health.latency_ms.cmp(&b.health.latency_ms))
                .then_with(|| b.health.last_success_ts.cmp(&a.health.last_success_ts))
                .then_with(|| a.health.sequence.cmp(&b.health.sequence))
        });

        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(url: &str) -> Instance {
        Instance::new(ServiceKind::Piped, url)
    }

    #[test]
    fn ranking_is_monotonic_in_failure_streak() {
        let tracker = HealthTracker::new();
        tracker.record_success(ServiceKind::Piped, "https://a", 100);
        tracker.record_failure(ServiceKind::Piped, "https://b");

        let ranked = tracker.rank(&[inst("https://b"), inst("https://a")]);
        assert_eq!(ranked[0].instance.base_url, "https://a");
        assert_eq!(ranked[1].instance.base_url, "https://b");
    }

    #[test]
    fn ranking_prefers_lower_latency_on_tie() {
        let tracker = HealthTracker::new();
        tracker.record_success(ServiceKind::Piped, "https://slow", 500);
        tracker.record_success(ServiceKind::Piped, "https://fast", 50);

        let ranked = tracker.rank(&[inst("https://slow"), inst("https://fast")]);
        assert_eq!(ranked[0].instance.base_url, "https://fast");
    }

    #[test]
    fn saturates_failure_streak_at_three_and_demotes_latency() {
        let tracker = HealthTracker::new();
        tracker.record_success(ServiceKind::Piped, "https://x", 80);
        for _ in 0..3 {
            tracker.record_failure(ServiceKind::Piped, "https://x");
        }
        let health = tracker.health_of(ServiceKind::Piped, "https://x");
        assert_eq!(health.failure_streak, 3);
        assert_eq!(health.latency_ms, INFINITE_LATENCY_MS);

        // A further failure does not overflow past the cap.
        tracker.record_failure(ServiceKind::Piped, "https://x");
        assert_eq!(tracker.health_of(ServiceKind::Piped, "https://x").failure_streak, 3);

        tracker.record_success(ServiceKind::Piped, "https://x", 42);
        let recovered = tracker.health_of(ServiceKind::Piped, "https://x");
        assert_eq!(recovered.failure_streak, 0);
        assert_eq!(recovered.latency_ms, 42);
    }

    #[test]
    fn demoted_instance_still_ranks_last_not_evicted() {
        let tracker = HealthTracker::new();
        for _ in 0..3 {
            tracker.record_failure(ServiceKind::Piped, "https://bad");
        }
        let ranked = tracker.rank(&[inst("https://bad"), inst("https://unknown")]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[1].instance.base_url, "https://bad");
    }
}
