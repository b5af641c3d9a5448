//! Video transcript retrieval
//!
//! The gateway only needs an ordered list of caption segments for a video id.
//! [`YouTubeTranscriptClient`] gets them by reading the caption track list
//! embedded in the watch page and downloading the chosen track in `json3`
//! form, routed through the configured outbound proxy.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Result, TextframeError};

const WATCH_URL: &str = "https://www.youtube.com/watch";
const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/124.0 Safari/537.36"
);

/// One caption line with its timing in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Outbound proxy used for transcript requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub http_url: String,
    pub https_url: String,
}

/// Produces the transcript of a video
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;
}

/// Serialize segments as a JSON array of `{text, start, duration}` objects
pub fn format_transcript(segments: &[TranscriptSegment]) -> Result<String> {
    serde_json::to_string(segments)
        .map_err(|e| TextframeError::Internal(format!("Failed to format transcript: {}", e)))
}

// =============================================================================
// Caption track discovery
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    fn is_english(&self) -> bool {
        self.language_code == "en" || self.language_code.starts_with("en-")
    }

    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Pull the `captionTracks` array out of a watch page
pub fn extract_caption_tracks(html: &str) -> Option<Vec<CaptionTrack>> {
    const MARKER: &str = "\"captionTracks\":";
    let start = html.find(MARKER)? + MARKER.len();

    serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<Vec<CaptionTrack>>()
        .next()?
        .ok()
}

/// Prefer a manual English track, then any English track, then the first one
pub fn select_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.is_english() && !t.is_generated())
        .or_else(|| tracks.iter().find(|t| t.is_english()))
        .or_else(|| tracks.first())
}

#[derive(Debug, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Flatten a `json3` caption document into segments, dropping empty events
pub fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    let doc: Json3Transcript = serde_json::from_str(body)
        .map_err(|e| TextframeError::Upstream(format!("Malformed caption track: {}", e)))?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                text: text.to_string(),
                start: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms as f64 / 1000.0,
            })
        })
        .collect())
}

// =============================================================================
// HTTP client
// =============================================================================

pub struct YouTubeTranscriptClient {
    http_client: reqwest::Client,
}

impl YouTubeTranscriptClient {
    pub fn new(proxy: Option<&ProxyConfig>, timeout: Duration) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT);

        if let Some(proxy) = proxy {
            let http = reqwest::Proxy::http(&proxy.http_url)
                .map_err(|e| TextframeError::Config(format!("Invalid HTTP proxy: {}", e)))?;
            let https = reqwest::Proxy::https(&proxy.https_url)
                .map_err(|e| TextframeError::Config(format!("Invalid HTTPS proxy: {}", e)))?;
            builder = builder.proxy(http).proxy(https);
        }

        let http_client = builder
            .build()
            .map_err(|e| TextframeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TextframeError::Upstream(format!(
                "Transcript source returned {}",
                status
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TranscriptFetcher for YouTubeTranscriptClient {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        let page = self.get_text(WATCH_URL, &[("v", video_id)]).await?;

        let tracks = extract_caption_tracks(&page).ok_or_else(|| {
            TextframeError::Upstream(format!("No transcript available for video {}", video_id))
        })?;
        let track = select_track(&tracks).ok_or_else(|| {
            TextframeError::Upstream(format!("No caption tracks for video {}", video_id))
        })?;

        debug!(
            video_id = %video_id,
            language = %track.language_code,
            generated = track.is_generated(),
            "Fetching caption track"
        );

        let body = self.get_text(&track.base_url, &[("fmt", "json3")]).await?;
        parse_json3(&body)
    }
}
