//! YouTube caption provider.
//!
//! Reads the caption track list from the innertube player endpoint and
//! downloads track content in the `json3` timed-text format.

use super::{CaptionProvider, CaptionSnippet, TranscriptList, TranscriptTrack};
use crate::config::YoutubeSettings;
use crate::error::{Result, TranscriptFailure, VidragError};
use crate::source::VideoId;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

fn api_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("Invalid regex")
    })
}

fn consent_value_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"name="v" value="(.*?)""#).expect("Invalid regex"))
}

/// Captions provider talking to YouTube over HTTP.
pub struct YoutubeCaptions {
    client: reqwest::Client,
    base_url: Url,
}

impl YoutubeCaptions {
    /// Create a provider for youtube.com with default timeout.
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider for a custom base URL and request timeout.
    pub fn with_config(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| VidragError::Config(format!("Invalid YouTube base URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn from_settings(settings: &YoutubeSettings) -> Result<Self> {
        Self::with_config(
            &settings.base_url,
            Duration::from_secs(settings.timeout_seconds),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| VidragError::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Fetch the watch page, accepting the cookie consent wall once if shown.
    async fn fetch_watch_html(&self, video_id: &VideoId) -> Result<String> {
        let mut url = self.endpoint("watch")?;
        url.query_pairs_mut().append_pair("v", video_id.as_str());

        let html = self.get_text(video_id, url.clone(), None).await?;

        if !html.contains("action=\"https://consent.youtube.com/s\"") {
            return Ok(html);
        }

        let consent = consent_value_regex()
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| provider_error(video_id, None, "Failed to accept YouTube cookie consent"))?;

        debug!("Accepting cookie consent and refetching watch page");
        let cookie = format!("CONSENT=YES+{}", consent);
        let html = self.get_text(video_id, url, Some(cookie)).await?;

        if html.contains("action=\"https://consent.youtube.com/s\"") {
            return Err(provider_error(
                video_id,
                None,
                "YouTube cookie consent could not be accepted",
            ));
        }
        Ok(html)
    }

    async fn get_text(&self, video_id: &VideoId, url: Url, cookie: Option<String>) -> Result<String> {
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US");
        if let Some(cookie) = cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let response = request.send().await?;
        let response = check_status(video_id, response).await?;
        Ok(response.text().await?)
    }

    async fn fetch_player(&self, video_id: &VideoId, api_key: &str) -> Result<PlayerResponse> {
        let mut url = self.endpoint("youtubei/v1/player")?;
        url.query_pairs_mut().append_pair("key", api_key);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id.as_str(),
        });

        let response = self.client.post(url).json(&body).send().await?;
        let response = check_status(video_id, response).await?;
        Ok(response.json::<PlayerResponse>().await?)
    }
}

#[async_trait]
impl CaptionProvider for YoutubeCaptions {
    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn list(&self, video_id: &VideoId) -> Result<TranscriptList> {
        let html = self.fetch_watch_html(video_id).await?;

        if html.contains("class=\"g-recaptcha\"") {
            return Err(provider_error(
                video_id,
                Some(429),
                "YouTube is rate limiting requests from this IP",
            ));
        }

        let api_key = api_key_regex()
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| provider_error(video_id, None, "Could not find the innertube API key"))?;

        let player = self.fetch_player(video_id, &api_key).await?;
        player.into_transcript_list(video_id)
    }

    #[instrument(skip(self, track), fields(language = %track.language_code))]
    async fn fetch(&self, track: &TranscriptTrack) -> Result<Vec<CaptionSnippet>> {
        let mut url = self.endpoint(&track.base_url)?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "fmt")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("fmt", "json3");

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            // An empty body means the track has no content.
            warn!("Caption track returned an empty body");
            return Ok(Vec::new());
        }

        let timed_text: TimedText = serde_json::from_str(&body)?;
        Ok(timed_text.into_snippets())
    }
}

async fn check_status(video_id: &VideoId, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(provider_error(
        video_id,
        Some(status.as_u16()),
        &format!(
            "YouTube request failed: {}",
            body.chars().take(200).collect::<String>()
        ),
    ))
}

fn provider_error(video_id: &VideoId, status: Option<u16>, message: &str) -> VidragError {
    VidragError::transcript(
        video_id.as_str(),
        TranscriptFailure::Provider {
            status,
            message: message.to_string(),
        },
    )
}

// === Innertube player response ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    #[serde(default)]
    playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer", default)]
    tracklist: Option<Tracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tracklist {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    name: TrackName,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    is_translatable: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    #[serde(default)]
    runs: Vec<TextRun>,
    #[serde(default)]
    simple_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl TrackName {
    fn text(&self) -> Option<String> {
        self.simple_text
            .clone()
            .or_else(|| self.runs.first().map(|r| r.text.clone()))
    }
}

impl PlayerResponse {
    fn into_transcript_list(self, video_id: &VideoId) -> Result<TranscriptList> {
        if let Some(playability) = &self.playability_status {
            let status = playability.status.as_deref().unwrap_or("OK");
            if status != "OK" {
                let reason = playability
                    .reason
                    .clone()
                    .unwrap_or_else(|| status.to_string());
                return Err(VidragError::transcript(
                    video_id.as_str(),
                    TranscriptFailure::VideoUnavailable(reason),
                ));
            }
        }

        let tracks = self
            .captions
            .and_then(|c| c.tracklist)
            .map(|t| t.caption_tracks)
            .unwrap_or_default();

        if tracks.is_empty() {
            return Err(VidragError::transcript(
                video_id.as_str(),
                TranscriptFailure::CaptionsDisabled,
            ));
        }

        let tracks = tracks
            .into_iter()
            .map(|t| TranscriptTrack {
                language: t.name.text().unwrap_or_else(|| t.language_code.clone()),
                language_code: t.language_code,
                is_generated: t.kind.as_deref() == Some("asr"),
                is_translatable: t.is_translatable,
                base_url: t.base_url.replace("&fmt=srv3", ""),
            })
            .collect();

        Ok(TranscriptList::new(video_id.as_str(), tracks))
    }
}

// === json3 timed text ===

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedEvent {
    #[serde(rename = "tStartMs", default)]
    start_ms: f64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: f64,
    #[serde(default)]
    segs: Vec<TimedSeg>,
}

#[derive(Debug, Deserialize)]
struct TimedSeg {
    #[serde(default)]
    utf8: String,
}

impl TimedText {
    fn into_snippets(self) -> Vec<CaptionSnippet> {
        self.events
            .into_iter()
            .filter_map(|event| {
                let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
                let text = text.replace('\n', " ").trim().to_string();
                if text.is_empty() {
                    return None;
                }
                Some(CaptionSnippet::new(
                    text,
                    event.start_ms / 1000.0,
                    event.duration_ms / 1000.0,
                ))
            })
            .collect()
    }
}
