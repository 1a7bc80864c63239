//! Startup configuration.
//!
//! A TOML file merged with prefixed environment variables via `figment`,
//! falling back to defaults when the file is absent rather than erroring.

mod defaults;

use defaults::*;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_piped")]
    pub piped: Vec<String>,
    #[serde(default = "default_invidious")]
    pub invidious: Vec<String>,
    #[serde(default)]
    pub hyperpipe: Vec<String>,
    #[serde(default)]
    pub proxy: Vec<String>,
    #[serde(default)]
    pub hls: Vec<String>,
    /// Alternate catalog endpoint; registered but unused by the core
    /// resolution/proxy path.
    #[serde(default)]
    pub jiosaavn: Option<String>,
    /// `"Y"`/`"N"` — reserved for a future active-probing loop. No probing is
    /// implemented; see the "No background probing" design note.
    #[serde(default = "default_health_flag")]
    pub health: String,
    #[serde(default = "default_music_region")]
    pub music_region: String,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiration_secs")]
    pub jwt_expiration_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            jwt_secret: default_jwt_secret(),
            jwt_expiration_secs: default_jwt_expiration_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            piped: default_piped(),
            invidious: default_invidious(),
            hyperpipe: Vec::new(),
            proxy: Vec::new(),
            hls: Vec::new(),
            jiosaavn: None,
            health: default_health_flag(),
            music_region: default_music_region(),
            web: WebConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_file = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> anyhow::Result<Self> {
        if !std::path::Path::new(config_file).exists() {
            tracing::warn!(
                "Config file '{}' not found, using default configuration values",
                config_file
            );
            let config: Config = Figment::new()
                .merge(Serialized::defaults(Self::default()))
                .merge(Env::prefixed("GATEWAY_").split("__"))
                .extract()?;
            return Ok(config);
        }

        let config: Config = Figment::new()
            .merge(Toml::file(config_file))
            .merge(Env::prefixed("GATEWAY_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// `MUSIC_REGION` has its own (unprefixed) env var, independent of the
    /// `GATEWAY_` namespace.
    pub fn resolve_music_region(&self) -> String {
        std::env::var("MUSIC_REGION").unwrap_or_else(|_| self.music_region.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_nonempty_instance_pools() {
        let config = Config::default();
        assert!(!config.piped.is_empty());
        assert!(!config.invidious.is_empty());
        assert_eq!(config.music_region, "IN");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_from_file("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config.web.port, default_port());
    }
}
