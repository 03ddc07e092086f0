//! YouTube video identifiers.

use crate::error::{Result, VidragError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Length of a YouTube video identifier.
pub const VIDEO_ID_LEN: usize = 11;

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // An 11-character token right after `v=` or any path separator.
    RE.get_or_init(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("Invalid regex"))
}

/// An 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Validate a bare identifier.
    pub fn parse(id: &str) -> Result<Self> {
        if id.len() == VIDEO_ID_LEN && id.chars().all(is_id_char) {
            Ok(Self(id.to_string()))
        } else {
            Err(VidragError::InvalidInput(format!(
                "'{}' is not an 11-character YouTube video id",
                id
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = VidragError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Extract the video identifier from a YouTube URL.
///
/// Handles watch (`?v=`), short (`youtu.be/`), embed and shorts links.
/// The first 11-character token following `v=` or `/` wins.
pub fn extract_video_id(url: &str) -> Result<VideoId> {
    video_id_regex()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
        .ok_or_else(|| VidragError::InvalidUrl {
            url: url.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        let cases = [
            "https://www.youtube.com/watch?v=Gfr50f6ZBvo",
            "https://youtube.com/watch?v=Gfr50f6ZBvo&t=42s",
            "https://www.youtube.com/watch?feature=share&v=Gfr50f6ZBvo",
            "https://youtu.be/Gfr50f6ZBvo",
            "https://youtu.be/Gfr50f6ZBvo?si=abcdef",
            "https://www.youtube.com/embed/Gfr50f6ZBvo",
            "https://www.youtube.com/shorts/Gfr50f6ZBvo",
        ];

        for url in cases {
            assert_eq!(extract_video_id(url).unwrap().as_str(), "Gfr50f6ZBvo", "{}", url);
        }
    }

    #[test]
    fn test_extract_keeps_id_charset() {
        let id = extract_video_id("https://youtu.be/a-b_C9d-E_f").unwrap();
        assert_eq!(id.as_str(), "a-b_C9d-E_f");
    }

    #[test]
    fn test_invalid_urls() {
        for url in [
            "",
            "not a url",
            "Gfr50f6ZBvo",
            "https://www.youtube.com/watch?v=short",
            "https://www.youtube.com/watch?vid=Gfr50f6ZBvo",
        ] {
            let err = extract_video_id(url).unwrap_err();
            assert!(matches!(err, VidragError::InvalidUrl { .. }), "{}", url);
        }
    }

    #[test]
    fn test_video_id_parse() {
        assert!(VideoId::parse("Gfr50f6ZBvo").is_ok());
        assert!(VideoId::parse("Gfr50f6ZBv").is_err());
        assert!(VideoId::parse("Gfr50f6ZBv!").is_err());
        assert_eq!(
            VideoId::parse("Gfr50f6ZBvo").unwrap().watch_url(),
            "https://www.youtube.com/watch?v=Gfr50f6ZBvo"
        );
    }
}
