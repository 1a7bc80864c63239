//! Invidious response schema and normalization.

use crate::models::{AudioVariant, VideoVariant};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct InvidiousResponse {
    #[serde(default, rename = "adaptiveFormats")]
    pub adaptive_formats: Vec<AdaptiveFormat>,
}

#[derive(Debug, Deserialize)]
pub struct AdaptiveFormat {
    #[serde(rename = "type", default)]
    pub format_type: String,
    #[serde(default)]
    pub bitrate: Option<String>,
    #[serde(default)]
    pub clen: Option<String>,
    #[serde(default)]
    pub itag: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub fps: Option<u32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "signatureCipher", default)]
    pub signature_cipher: Option<String>,
}

impl AdaptiveFormat {
    pub fn is_audio(&self) -> bool {
        self.format_type.starts_with("audio/")
    }

    pub fn is_video(&self) -> bool {
        self.format_type.starts_with("video/")
    }

    fn itag_num(&self) -> Option<u32> {
        self.itag.as_deref().and_then(|s| s.parse().ok())
    }

    fn bitrate_num(&self) -> u64 {
        self.bitrate.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0)
    }

    fn content_length_num(&self) -> Option<u64> {
        self.clen.as_deref().and_then(|s| s.parse().ok())
    }

    /// Resolves a playable URL: direct `url`, else parse `signatureCipher`
    /// as form-encoded and append `sig=`, else synthesize a `/latest_version`
    /// fallback from the itag.
    pub fn resolve_url(&self, instance_base: &str, video_id: &str) -> Option<String> {
        if let Some(url) = &self.url {
            return Some(url.clone());
        }

        if let Some(cipher) = &self.signature_cipher {
            if let Some(url) = resolve_signature_cipher(cipher) {
                return Some(url);
            }
        }

        self.itag_num().map(|itag| {
            format!("{instance_base}/latest_version?id={video_id}&itag={itag}&local=true")
        })
    }

    fn mime_type(&self) -> String {
        self.format_type
            .split(';')
            .next()
            .unwrap_or(&self.format_type)
            .trim()
            .to_string()
    }

    /// Extracts the `codecs="..."` parameter from `type`
    /// (e.g. `audio/webm; codecs="opus"` -> `"opus"`), falling back to a
    /// container-based guess when the parameter is absent.
    fn codec(&self) -> String {
        for part in self.format_type.split(';').skip(1) {
            let part = part.trim();
            if let Some(rest) = part.strip_prefix("codecs=") {
                return rest.trim_matches('"').to_string();
            }
        }
        let container = self.format_type.split(';').next().unwrap_or("").trim();
        match container {
            "audio/webm" | "video/webm" => "opus".to_string(),
            "audio/mp4" | "video/mp4" => "aac".to_string(),
            _ => String::new(),
        }
    }
}

/// Parses a form-encoded `signatureCipher` payload (`url=...&sig=...` or
/// `url=...&s=...`), appending the signature to the URL with the correct
/// separator.
fn resolve_signature_cipher(cipher: &str) -> Option<String> {
    let mut url = None;
    let mut sig = None;

    for (key, value) in url::form_urlencoded::parse(cipher.as_bytes()) {
        match key.as_ref() {
            "url" => url = Some(value.into_owned()),
            "sig" | "s" => sig = Some(value.into_owned()),
            _ => {}
        }
    }

    let url = url?;
    match sig {
        Some(sig) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            Some(format!("{url}{separator}sig={sig}"))
        }
        None => Some(url),
    }
}

pub fn to_audio_ladder(response: &InvidiousResponse, instance_base: &str, video_id: &str) -> Vec<AudioVariant> {
    response
        .adaptive_formats
        .iter()
        .filter(|f| f.is_audio())
        .filter_map(|f| {
            let url = f.resolve_url(instance_base, video_id)?;
            Some(AudioVariant {
                url,
                bitrate: f.bitrate_num(),
                codec: f.codec(),
                mime_type: f.mime_type(),
                content_length: f.content_length_num(),
            })
        })
        .collect()
}

pub fn to_video_ladder(response: &InvidiousResponse, instance_base: &str, video_id: &str) -> Vec<VideoVariant> {
    response
        .adaptive_formats
        .iter()
        .filter(|f| f.is_video())
        .filter_map(|f| {
            let url = f.resolve_url(instance_base, video_id)?;
            Some(VideoVariant {
                url,
                height: f.height,
                width: f.width,
                fps: f.fps,
                itag: f.itag_num(),
                bitrate: if f.bitrate_num() > 0 { Some(f.bitrate_num()) } else { None },
                codec: None,
                quality_label: super::quality_label_for_height(f.height, f.itag_num()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_cipher_appends_sig_with_question_mark() {
        let cipher = "url=https%3A%2F%2Fexample.com%2Fvideo&sig=abc123";
        let resolved = resolve_signature_cipher(cipher).unwrap();
        assert_eq!(resolved, "https://example.com/video?sig=abc123");
    }

    #[test]
    fn signature_cipher_appends_sig_with_ampersand_when_query_present() {
        let cipher = "url=https%3A%2F%2Fexample.com%2Fvideo%3Fa%3D1&sig=abc123";
        let resolved = resolve_signature_cipher(cipher).unwrap();
        assert_eq!(resolved, "https://example.com/video?a=1&sig=abc123");
    }

    #[test]
    fn missing_url_and_cipher_falls_back_to_latest_version_with_itag() {
        let format = AdaptiveFormat {
            format_type: "audio/webm".to_string(),
            bitrate: Some("128000".to_string()),
            clen: None,
            itag: Some("251".to_string()),
            height: None,
            width: None,
            fps: None,
            url: None,
            signature_cipher: None,
        };
        let resolved = format.resolve_url("https://inv.example", "abc123").unwrap();
        assert_eq!(resolved, "https://inv.example/latest_version?id=abc123&itag=251&local=true");
    }
}
