//! Transcript command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{format_duration, Output};
use crate::config::Settings;
use crate::source::extract_video_id;
use crate::transcript::{fetch_transcript, LanguagePreference, YoutubeCaptions};
use anyhow::Result;

/// Fetch a transcript and print it or write it to a file.
pub async fn run_transcript(url: &str, output: Option<String>, json: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Transcript, &settings)?;

    let video_id = extract_video_id(url)?;
    let captions = YoutubeCaptions::from_settings(&settings.youtube)?;
    let preference = LanguagePreference::from(&settings.youtube);

    let spinner = Output::spinner(&format!("Fetching captions for {}...", video_id));
    let result = fetch_transcript(&captions, &video_id, &preference).await;
    spinner.finish_and_clear();

    let transcript = match result {
        Ok(t) => t,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    let rendered = if json {
        serde_json::to_string_pretty(&transcript)?
    } else {
        transcript.text.clone()
    };

    match output {
        Some(path) => {
            let path = Settings::expand_path(&path);
            std::fs::write(&path, rendered)?;
            Output::success(&format!("Transcript written to {}", path.display()));
            Output::kv("Language", &transcript.language_code);
            Output::kv("Generated", &transcript.is_generated.to_string());
            Output::kv("Snippets", &transcript.snippet_count.to_string());
            Output::kv("Duration", &format_duration(transcript.duration_seconds));
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
