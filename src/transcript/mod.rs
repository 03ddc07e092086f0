//! Caption retrieval.
//!
//! A [`CaptionProvider`] lists the caption tracks of a video and fetches the
//! timed snippets of one track. [`fetch_transcript`] picks a track according
//! to a [`LanguagePreference`] and joins its snippets into one text blob.

mod youtube;

pub use youtube::YoutubeCaptions;

use crate::error::{Result, TranscriptFailure, VidragError};
use crate::source::VideoId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// One timed caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSnippet {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl CaptionSnippet {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// A caption track offered for a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTrack {
    /// Language code, e.g. `en` or `pt-BR`.
    pub language_code: String,
    /// Human readable language name.
    pub language: String,
    /// Whether the track was generated by speech recognition.
    pub is_generated: bool,
    /// Whether the provider can translate this track.
    pub is_translatable: bool,
    /// Provider URL for the caption content.
    pub base_url: String,
}

/// All caption tracks of one video.
///
/// Manually created tracks come before generated ones; provider order is
/// kept within each group.
#[derive(Debug, Clone, Default)]
pub struct TranscriptList {
    video_id: String,
    tracks: Vec<TranscriptTrack>,
}

impl TranscriptList {
    pub fn new(video_id: impl Into<String>, mut tracks: Vec<TranscriptTrack>) -> Self {
        // Stable sort keeps provider order inside each group.
        tracks.sort_by_key(|t| t.is_generated);
        Self {
            video_id: video_id.into(),
            tracks,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptTrack> {
        self.tracks.iter()
    }

    /// First track matching the language codes, in the order given.
    ///
    /// For each code a manually created track wins over a generated one.
    pub fn find_transcript<S: AsRef<str>>(&self, language_codes: &[S]) -> Option<&TranscriptTrack> {
        language_codes.iter().find_map(|code| {
            self.tracks
                .iter()
                .find(|t| t.language_code == code.as_ref())
        })
    }

    /// First available track.
    pub fn first(&self) -> Option<&TranscriptTrack> {
        self.tracks.first()
    }

    /// Apply a language preference: preferred languages first, then any track.
    pub fn select(&self, preference: &LanguagePreference) -> Option<&TranscriptTrack> {
        self.find_transcript(&preference.languages).or_else(|| {
            if preference.fallback_to_any {
                self.first()
            } else {
                None
            }
        })
    }
}

/// Ordered caption language preference.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguagePreference {
    /// Language codes in order of preference.
    pub languages: Vec<String>,
    /// Use the first available track when none of `languages` exists.
    pub fallback_to_any: bool,
}

impl Default for LanguagePreference {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            fallback_to_any: true,
        }
    }
}

impl From<&crate::config::YoutubeSettings> for LanguagePreference {
    fn from(settings: &crate::config::YoutubeSettings) -> Self {
        Self {
            languages: settings.languages.clone(),
            fallback_to_any: settings.fallback_to_any,
        }
    }
}

/// Trait for caption providers.
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// List the caption tracks available for a video.
    async fn list(&self, video_id: &VideoId) -> Result<TranscriptList>;

    /// Fetch the timed snippets of one track.
    async fn fetch(&self, track: &TranscriptTrack) -> Result<Vec<CaptionSnippet>>;
}

/// The joined transcript of one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptText {
    pub video_id: VideoId,
    /// Language code of the selected track.
    pub language_code: String,
    /// Whether the selected track was auto-generated.
    pub is_generated: bool,
    /// Snippet texts joined by single spaces.
    pub text: String,
    /// Number of snippets in the track.
    pub snippet_count: usize,
    /// End of the last snippet, in seconds.
    pub duration_seconds: f64,
}

/// Fetch the transcript of a video as one text blob.
///
/// Fails with a transcript-unavailable error when captions are disabled, no
/// track matches the preference, the provider fails, or the text is empty.
#[instrument(skip(provider, preference), fields(video_id = %video_id))]
pub async fn fetch_transcript(
    provider: &dyn CaptionProvider,
    video_id: &VideoId,
    preference: &LanguagePreference,
) -> Result<TranscriptText> {
    let list = provider
        .list(video_id)
        .await
        .map_err(|e| as_transcript_error(video_id, e))?;

    if list.is_empty() {
        return Err(VidragError::transcript(
            video_id.as_str(),
            TranscriptFailure::CaptionsDisabled,
        ));
    }

    let track = list.select(preference).ok_or_else(|| {
        VidragError::transcript(
            video_id.as_str(),
            TranscriptFailure::NoTranscriptFound {
                requested: preference.languages.clone(),
            },
        )
    })?;

    debug!(
        "Selected {} track ({}, generated: {})",
        track.language_code, track.language, track.is_generated
    );

    let snippets = provider
        .fetch(track)
        .await
        .map_err(|e| as_transcript_error(video_id, e))?;

    let text = snippets
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    if text.trim().is_empty() {
        return Err(VidragError::transcript(
            video_id.as_str(),
            TranscriptFailure::Empty,
        ));
    }

    let duration_seconds = snippets
        .last()
        .map(|s| s.start + s.duration)
        .unwrap_or(0.0);

    info!(
        "Fetched {} caption snippets ({} chars)",
        snippets.len(),
        text.chars().count()
    );

    Ok(TranscriptText {
        video_id: video_id.clone(),
        language_code: track.language_code.clone(),
        is_generated: track.is_generated,
        text,
        snippet_count: snippets.len(),
        duration_seconds,
    })
}

/// Fold any provider error into the transcript-unavailable taxonomy.
fn as_transcript_error(video_id: &VideoId, err: VidragError) -> VidragError {
    match err {
        e @ VidragError::TranscriptUnavailable { .. } => e,
        VidragError::Http(e) => VidragError::transcript(
            video_id.as_str(),
            TranscriptFailure::Provider {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
        ),
        other => VidragError::transcript(
            video_id.as_str(),
            TranscriptFailure::Provider {
                status: None,
                message: other.to_string(),
            },
        ),
    }
}
