//! Audio submission command.
//!
//! Validates the file, sends it to the comparison server together with a
//! song key, and reports the score and result page. With no file argument,
//! the most recent recording is submitted.

use crate::config::SingmatchConfig;
use crate::recording::{history, RecordingHistory};
use crate::submit::{ensure_audio_file, resolve_redirect, ComparisonClient};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

/// Handles audio submission.
///
/// # Arguments
/// * `file` - Audio file to submit; None submits the most recent recording
/// * `song_key` - Reference track; None falls back to config or a prompt
/// * `open` - Open the result page in the system browser
pub async fn handle_submit(
    file: Option<PathBuf>,
    song_key: Option<String>,
    open: bool,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== singmatch submit started ===");

    let config = match SingmatchConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            cliclack::log::error(format!(
                "Configuration error: {err}\n\nCheck your ~/.config/singmatch/singmatch.toml and try again."
            ))?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    cliclack::intro("singmatch submit")?;

    let file = match file {
        Some(path) => path,
        None => last_recording_path()?,
    };

    // Validate before anything touches the network; a non-audio file
    // never produces a request
    if let Err(e) = ensure_audio_file(&file) {
        cliclack::log::error(e.to_string())?;
        return Err(e);
    }

    let song_key = match song_key {
        Some(key) => key,
        None => pick_song_key(&config)?,
    };

    if !config.songs.keys.is_empty() && !config.songs.keys.contains(&song_key) {
        cliclack::log::warning(format!(
            "Song key '{}' is not in the configured list; the server may reject it.",
            song_key
        ))?;
    }

    let client = ComparisonClient::new(
        config.server.endpoint.clone(),
        Duration::from_secs(config.server.timeout_secs),
    );

    let spinner = cliclack::spinner();
    spinner.start(format!("Comparing against '{}'...", song_key));

    let result = match client.submit(&file, &song_key).await {
        Ok(result) => {
            spinner.stop("Comparison complete");
            result
        }
        Err(e) => {
            // Clear the loading state so the prompt is usable again
            spinner.error("Comparison failed");
            tracing::error!("Submission failed: {}", e);
            cliclack::log::error(e.to_string())?;
            return Err(e);
        }
    };

    if let Some(score) = result.score {
        cliclack::log::info(format!("Similarity score: {score:.1}"))?;
    }

    let result_url = resolve_redirect(client.endpoint(), &result.redirect_url)?;
    cliclack::log::success(format!("Result page: {result_url}"))?;

    if open {
        open_in_browser(&result_url)?;
    }

    cliclack::outro("Done")?;
    tracing::info!("=== singmatch submit exited successfully ===");
    Ok(())
}

/// Finds the audio file of the most recent recording.
///
/// # Errors
/// - If there is no recording history yet
fn last_recording_path() -> Result<PathBuf, anyhow::Error> {
    let history = RecordingHistory::new(&history::data_dir()?)?;
    let last = history
        .last_recording()?
        .ok_or_else(|| anyhow::anyhow!("No recordings found. Run 'singmatch record' first."))?;

    tracing::info!("Submitting last recording: {}", last.audio_path.display());
    Ok(last.audio_path)
}

/// Picks a song key: the configured default, or an interactive selection
/// when several keys are configured and no default is set.
fn pick_song_key(config: &SingmatchConfig) -> Result<String, anyhow::Error> {
    if let Some(default) = &config.songs.default_key {
        return Ok(default.clone());
    }

    if config.songs.keys.is_empty() {
        return Err(anyhow::anyhow!(
            "No song keys configured. Add some under [songs] in singmatch.toml."
        ));
    }

    let mut select = cliclack::select("Which reference track is this performance of?");
    for key in &config.songs.keys {
        select = select.item(key.clone(), key, "");
    }
    let picked = select.interact()?;

    Ok(picked)
}

/// Opens the result page with the platform's URL opener.
fn open_in_browser(url: &str) -> Result<(), anyhow::Error> {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(not(target_os = "macos"))]
    let opener = "xdg-open";

    Command::new(opener)
        .arg(url)
        .spawn()
        .map_err(|e| anyhow::anyhow!("Failed to open browser with {opener}: {e}"))?;

    tracing::info!("Opened result page in browser: {}", url);
    Ok(())
}
