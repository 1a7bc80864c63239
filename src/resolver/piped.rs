//! Piped response schema and normalization.

use crate::models::{AudioVariant, VideoVariant};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PipedResponse {
    #[serde(default, rename = "audioStreams")]
    pub audio_streams: Vec<PipedStream>,
    #[serde(default, rename = "videoStreams")]
    pub video_streams: Vec<PipedStream>,
    #[serde(default)]
    pub hls: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PipedStream {
    pub url: Option<String>,
    #[serde(default)]
    pub bitrate: u64,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<u32>,
    #[serde(default)]
    pub itag: Option<u32>,
    #[serde(rename = "contentLength", default)]
    pub content_length: Option<u64>,
}

/// Extracts the `__NEXT_DATA__` JSON blob some piped instances wrap their
/// response in. Returns `None` if the marker isn't present.
pub fn extract_next_data(html: &str) -> Option<&str> {
    let start_marker = "<script id=\"__NEXT_DATA__\"";
    let start = html.find(start_marker)?;
    let after_tag = html[start..].find('>')? + start + 1;
    let end = html[after_tag..].find("</script>")? + after_tag;
    Some(html[after_tag..end].trim())
}

pub fn to_audio_ladder(response: &PipedResponse) -> Vec<AudioVariant> {
    response
        .audio_streams
        .iter()
        .filter_map(|stream| {
            let url = stream.url.clone()?;
            Some(AudioVariant {
                url,
                bitrate: stream.bitrate,
                codec: stream.codec.clone().unwrap_or_default(),
                mime_type: stream.mime_type.clone().unwrap_or_else(|| "audio/webm".to_string()),
                content_length: stream.content_length,
            })
        })
        .collect()
}

pub fn to_video_ladder(response: &PipedResponse) -> Vec<VideoVariant> {
    response
        .video_streams
        .iter()
        .filter_map(|stream| {
            let url = stream.url.clone()?;
            Some(VideoVariant {
                url,
                height: stream.height,
                width: stream.width,
                fps: stream.fps,
                itag: stream.itag,
                bitrate: if stream.bitrate > 0 { Some(stream.bitrate) } else { None },
                codec: stream.codec.clone(),
                quality_label: super::quality_label_for_height(stream.height, stream.itag),
            })
        })
        .collect()
}
