//! HTTP client for the comparison endpoint.
//!
//! Sends the audio file and song key as multipart form data and turns every
//! failure mode into a human-readable message.

use super::{ensure_audio_file, ComparisonResponse, ComparisonResult};
use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::Duration;

/// Client for one comparison endpoint.
pub struct ComparisonClient {
    endpoint: String,
    timeout: Duration,
}

impl ComparisonClient {
    /// Creates a client for the given endpoint with a request timeout.
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    /// The endpoint this client submits to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submits an audio file and song key for comparison.
    ///
    /// The file is validated as audio before anything is read or sent.
    ///
    /// # Errors
    /// - If the file is missing or not an audio type (no request is issued)
    /// - If the request fails (connection refused, timeout)
    /// - If the server answers with a non-2xx status
    /// - If the response body cannot be parsed or lacks `redirect_url`
    pub async fn submit(&self, file: &Path, song_key: &str) -> Result<ComparisonResult> {
        let mime = ensure_audio_file(file)?;

        let audio_data = std::fs::read(file)
            .map_err(|e| anyhow!("Failed to read audio file {}: {e}", file.display()))?;

        let file_name = file
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        tracing::info!(
            "Submitting {} ({} bytes, {}) for song key '{}' to {}",
            file_name,
            audio_data.len(),
            mime,
            song_key,
            self.endpoint
        );

        let file_part = reqwest::multipart::Part::bytes(audio_data)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| anyhow!("Failed to create file part for upload: {e}"))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("song_key", song_key.to_string());

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {e}"))?;

        let response = match client.post(&self.endpoint).multipart(form).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let error_msg = if e.is_connect() {
                    format!(
                        "Could not reach the comparison server at {}. Is it running?",
                        self.endpoint
                    )
                } else if e.is_timeout() {
                    "The comparison request timed out. The server is not responding.".to_string()
                } else {
                    format!("Network error during submission: {e}")
                };
                return Err(anyhow!(error_msg));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            // The server answers 400 with a JSON error body; show its message
            let server_message = serde_json::from_str::<ComparisonResponse>(&error_body)
                .ok()
                .and_then(|body| body.error);

            let human_readable = match (status.as_u16(), server_message) {
                (400, Some(msg)) => format!("The server rejected the submission: {msg}"),
                (404, _) => format!(
                    "The comparison endpoint {} was not found. Check the server config.",
                    self.endpoint
                ),
                (413, _) => "The audio file is too large for the server to accept.".to_string(),
                (500..=504, _) => {
                    "The comparison server hit an internal error. Please try again later."
                        .to_string()
                }
                _ => format!("Comparison failed (status {status}): {error_body}"),
            };

            return Err(anyhow!(human_readable));
        }

        let body: ComparisonResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse server response: {e}"))?;

        let result = body.into_result()?;
        tracing::info!(
            "Comparison result: score={:?}, redirect_url={}",
            result.score,
            result.redirect_url
        );

        Ok(result)
    }
}
