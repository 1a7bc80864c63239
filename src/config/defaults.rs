//! Default configuration values, centralized in one module.

pub fn default_piped() -> Vec<String> {
    vec![
        "https://pipedapi.kavin.rocks".to_string(),
        "https://piped-api.privacy.com.de".to_string(),
    ]
}

pub fn default_invidious() -> Vec<String> {
    vec![
        "https://invidious.protokolla.fi".to_string(),
        "https://yt.artemislena.eu".to_string(),
    ]
}

pub fn default_health_flag() -> String {
    "N".to_string()
}

pub fn default_music_region() -> String {
    "IN".to_string()
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    8080
}

pub fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

pub fn default_jwt_expiration_secs() -> u64 {
    3600
}

pub fn default_user_agent() -> String {
    format!("media-gateway/{}", env!("CARGO_PKG_VERSION"))
}
