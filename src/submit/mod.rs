//! Audio submission to the comparison service.
//!
//! One parameterized operation covers every intake path: a file (recorded or
//! supplied by the user) and a song key are packaged into a multipart form
//! and POSTed to the configured endpoint, which answers with a similarity
//! score and the result page to go to. File-type validation runs before any
//! network I/O, so a non-audio file never produces a request.

mod client;

pub use client::ComparisonClient;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use url::Url;

/// Verdict returned by the comparison service.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    /// Similarity score, when the server includes one
    pub score: Option<f64>,
    /// Result page for this submission
    pub redirect_url: String,
}

/// Raw wire format of the server's JSON body.
///
/// `redirect_url` is required for a usable verdict; `score` is optional
/// because the server omits it on some branches. `error` carries the
/// server's message on 4xx responses.
#[derive(Debug, Deserialize)]
struct ComparisonResponse {
    score: Option<f64>,
    redirect_url: Option<String>,
    error: Option<String>,
}

impl ComparisonResponse {
    /// Validates the wire body into a usable result.
    ///
    /// # Errors
    /// - If the body carries a server error message
    /// - If `redirect_url` is absent
    fn into_result(self) -> Result<ComparisonResult> {
        if let Some(error) = self.error {
            return Err(anyhow!("Server rejected the submission: {error}"));
        }

        let redirect_url = self
            .redirect_url
            .ok_or_else(|| anyhow!("Server response did not include a result page URL"))?;

        Ok(ComparisonResult {
            score: self.score,
            redirect_url,
        })
    }
}

/// Audio file extensions the service accepts, with their MIME types.
const AUDIO_TYPES: &[(&str, &str)] = &[
    ("wav", "audio/wav"),
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("flac", "audio/flac"),
    ("webm", "audio/webm"),
];

/// Returns the MIME type for a path with a known audio extension.
pub fn audio_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    AUDIO_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Checks that the path exists and looks like an audio file.
///
/// Runs before any upload is attempted, on every intake path.
///
/// # Errors
/// - If the file does not exist
/// - If the extension is not a known audio type
pub fn ensure_audio_file(path: &Path) -> Result<&'static str> {
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }

    audio_mime(path).ok_or_else(|| {
        anyhow!(
            "'{}' is not an audio file. Supported types: {}",
            path.display(),
            AUDIO_TYPES
                .iter()
                .map(|(ext, _)| *ext)
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

/// Resolves the result page URL against the endpoint's origin.
///
/// The server answers with paths like `/good`; those are joined onto the
/// endpoint base. An already-absolute URL passes through unchanged.
///
/// # Errors
/// - If the endpoint is not a valid base URL
/// - If the redirect cannot be joined onto it
pub fn resolve_redirect(endpoint: &str, redirect_url: &str) -> Result<String> {
    if Url::parse(redirect_url).is_ok() {
        return Ok(redirect_url.to_string());
    }

    let base = Url::parse(endpoint)
        .map_err(|e| anyhow!("Invalid endpoint URL '{endpoint}': {e}"))?;
    let resolved = base
        .join(redirect_url)
        .map_err(|e| anyhow!("Invalid result page URL '{redirect_url}': {e}"))?;

    Ok(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn known_audio_extensions_map_to_mime_types() {
        assert_eq!(audio_mime(Path::new("take.wav")), Some("audio/wav"));
        assert_eq!(audio_mime(Path::new("Take.MP3")), Some("audio/mpeg"));
        assert_eq!(audio_mime(Path::new("a/b/voice.ogg")), Some("audio/ogg"));
    }

    #[test]
    fn non_audio_extensions_are_rejected() {
        assert!(audio_mime(Path::new("notes.txt")).is_none());
        assert!(audio_mime(Path::new("クリップ.mov")).is_none());
        assert!(audio_mime(Path::new("no_extension")).is_none());
    }

    #[test]
    fn missing_file_fails_validation_before_type_check() {
        let err = ensure_audio_file(Path::new("/nonexistent/take.wav")).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn existing_non_audio_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("notes.txt");
        std::fs::write(&path, "not audio").unwrap();

        let err = ensure_audio_file(&path).unwrap_err();
        assert!(err.to_string().contains("not an audio file"));
    }

    #[test]
    fn full_response_parses() {
        let body = r#"{"score": 31250.5, "redirect_url": "/good"}"#;
        let response: ComparisonResponse = serde_json::from_str(body).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.score, Some(31250.5));
        assert_eq!(result.redirect_url, "/good");
    }

    #[test]
    fn score_is_optional_on_the_wire() {
        let body = r#"{"redirect_url": "/soso"}"#;
        let response: ComparisonResponse = serde_json::from_str(body).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.score, None);
        assert_eq!(result.redirect_url, "/soso");
    }

    #[test]
    fn missing_redirect_url_is_an_error() {
        let body = r#"{"score": 12.0}"#;
        let response: ComparisonResponse = serde_json::from_str(body).unwrap();
        let err = response.into_result().unwrap_err();
        assert!(err.to_string().contains("result page URL"));
    }

    #[test]
    fn server_error_body_is_surfaced() {
        let body = r#"{"error": "Invalid song_key provided"}"#;
        let response: ComparisonResponse = serde_json::from_str(body).unwrap();
        let err = response.into_result().unwrap_err();
        assert!(err.to_string().contains("Invalid song_key"));
    }

    #[test]
    fn relative_redirect_resolves_against_endpoint_origin() {
        let resolved =
            resolve_redirect("http://127.0.0.1:5000/compare", "/good").unwrap();
        assert_eq!(resolved, "http://127.0.0.1:5000/good");
    }

    #[test]
    fn absolute_redirect_passes_through() {
        let resolved = resolve_redirect(
            "http://127.0.0.1:5000/compare",
            "https://results.example.com/good",
        )
        .unwrap();
        assert_eq!(resolved, "https://results.example.com/good");
    }
}
