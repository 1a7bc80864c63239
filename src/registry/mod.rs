//! Instance Registry.
//!
//! Holds a per-kind snapshot of normalized base URLs behind an immutable,
//! swappable pointer: readers capture the current `Arc` at the start of an
//! operation, writers publish a new one with `replace`. In-flight operations
//! complete against whichever snapshot they observed, since the `Arc` they
//! hold keeps the old data alive.

use crate::config::Config;
use crate::models::{Instance, ServiceKind, normalize_base_url};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default)]
struct RegistrySnapshot {
    by_kind: HashMap<ServiceKind, Vec<Instance>>,
}

impl RegistrySnapshot {
    fn from_config(config: &Config) -> Self {
        let mut by_kind = HashMap::new();
        by_kind.insert(ServiceKind::Piped, dedup_instances(ServiceKind::Piped, &config.piped));
        by_kind.insert(
            ServiceKind::Invidious,
            dedup_instances(ServiceKind::Invidious, &config.invidious),
        );
        by_kind.insert(
            ServiceKind::Hyperpipe,
            dedup_instances(ServiceKind::Hyperpipe, &config.hyperpipe),
        );
        by_kind.insert(ServiceKind::Proxy, dedup_instances(ServiceKind::Proxy, &config.proxy));
        by_kind.insert(ServiceKind::Hls, dedup_instances(ServiceKind::Hls, &config.hls));
        Self { by_kind }
    }
}

fn dedup_instances(kind: ServiceKind, raw_urls: &[String]) -> Vec<Instance> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for raw in raw_urls {
        let normalized = normalize_base_url(raw);
        if seen.insert(normalized.clone()) {
            out.push(Instance { kind, base_url: normalized });
        }
    }
    out
}

/// Thread-safe, swappable registry of upstream instances.
pub struct InstanceRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl InstanceRegistry {
    pub fn new(config: &Config) -> Self {
        Self {
            current: RwLock::new(Arc::new(RegistrySnapshot::from_config(config))),
        }
    }

    fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.read().expect("registry lock poisoned").clone()
    }

    /// Returns the stable snapshot of normalized base URLs for `kind`.
    pub fn instances(&self, kind: ServiceKind) -> Vec<Instance> {
        self.snapshot().by_kind.get(&kind).cloned().unwrap_or_default()
    }

    /// Atomically swap all per-kind lists. Previously captured `Arc` clones
    /// (e.g. held by an in-flight `fetch_raw` call) remain valid and complete
    /// against the old data; only new calls observe the replacement.
    pub fn replace(&self, config: &Config) {
        let next = Arc::new(RegistrySnapshot::from_config(config));
        *self.current.write().expect("registry lock poisoned") = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(piped: &[&str]) -> Config {
        let mut config = Config::default();
        config.piped = piped.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn strips_trailing_slashes_and_dedups() {
        let config = config_with(&["https://a.example/", "https://a.example", "https://b.example/"]);
        let registry = InstanceRegistry::new(&config);
        let instances = registry.instances(ServiceKind::Piped);
        assert_eq!(instances.len(), 2);
        assert!(instances.iter().all(|i| !i.base_url.ends_with('/')));
    }

    #[test]
    fn replace_swaps_whole_list() {
        let registry = InstanceRegistry::new(&config_with(&["https://a.example"]));
        assert_eq!(registry.instances(ServiceKind::Piped).len(), 1);

        registry.replace(&config_with(&["https://c.example", "https://d.example"]));
        let instances = registry.instances(ServiceKind::Piped);
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].base_url, "https://c.example");
    }

    #[test]
    fn in_flight_snapshot_survives_replace() {
        let registry = InstanceRegistry::new(&config_with(&["https://a.example"]));
        let held = registry.snapshot();
        registry.replace(&config_with(&["https://b.example"]));
        assert_eq!(held.by_kind[&ServiceKind::Piped][0].base_url, "https://a.example");
    }
}
