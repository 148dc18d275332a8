//! Microphone recording command.
//!
//! Drives the recording session lifecycle: start capture, stop when the
//! configured duration elapses or the user presses a key, save the result
//! as a WAV file, and register it in the recording history.

use crate::config::SingmatchConfig;
use crate::recording::{
    history, RecordingCommand, RecordingHistory, RecordingPrompt, RecordingSession, StopReason,
};
use chrono::Local;
use std::time::Duration;

/// Fixed filename a copy of the latest recording is kept under, matching
/// the original service's forced download name. Each recording also gets
/// its own timestamped file so history eviction and replay-by-index work
/// on distinct files.
const LATEST_RECORDING_FILENAME: &str = "recorded_audio.wav";

/// How long each keyboard poll waits before the loop re-checks the deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handles microphone recording.
///
/// Records until the configured duration elapses (Enter/Space stop early,
/// Escape/q break the recording off), then saves the audio and optionally
/// plays it back.
pub async fn handle_record(play: bool) -> Result<(), anyhow::Error> {
    tracing::info!("=== singmatch record started ===");

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

    let auto_stop = config.recording.auto_stop();
    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, auto_stop={:?}",
        config.audio.device,
        config.audio.sample_rate,
        auto_stop
    );

    cliclack::intro("singmatch")?;

    let mut session = match RecordingSession::start(&config.audio, auto_stop) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to start recording: {}", e);
            cliclack::log::error(format!(
                "Could not open the microphone: {e}\n\nCheck your audio configuration and try 'singmatch list-devices'."
            ))?;
            return Err(e);
        }
    };

    let mut prompt = RecordingPrompt::new()?;
    let reason = run_recording_loop(&mut session, &prompt, auto_stop)?;
    prompt.finish();

    let data_dir = history::data_dir()?;
    let output_path = data_dir.join(format!(
        "recording_{}.wav",
        Local::now().timestamp_millis()
    ));
    let saved = session.save(&output_path).map_err(|e| {
        tracing::error!("Failed to save recording: {}", e);
        e
    })?;

    if !saved {
        cliclack::log::warning("Nothing was captured; no file written.")?;
        cliclack::outro("Done")?;
        return Ok(());
    }

    // The power stop suppresses the completion notice in favor of a
    // distinct "interrupted" one
    if reason.is_interrupted() {
        cliclack::log::warning("Recording interrupted.")?;
    } else {
        cliclack::log::success("Recording finished.")?;
    }

    // Fixed-name copy of the latest take
    let latest_path = data_dir.join(LATEST_RECORDING_FILENAME);
    if let Err(e) = std::fs::copy(&output_path, &latest_path) {
        tracing::warn!("Failed to update latest recording copy: {}", e);
    }

    let history = RecordingHistory::new(&data_dir)?;
    if let Err(e) = history.save_recording(output_path.clone(), config.songs.default_key.clone()) {
        tracing::warn!("Failed to save recording to history: {}", e);
    }

    cliclack::log::info(format!("Saved to {}", output_path.display()))?;

    if play {
        super::replay::play_file(&output_path)?;
    }

    cliclack::outro("Submit it with 'singmatch submit'.")?;
    tracing::info!("=== singmatch record exited successfully ===");
    Ok(())
}

/// Polls for keypresses and the auto-stop deadline until the session ends.
///
/// Both stop paths go through the session's idempotent stop, so a timed
/// stop racing a keypress cannot stop the stream twice.
fn run_recording_loop(
    session: &mut RecordingSession,
    prompt: &RecordingPrompt,
    auto_stop: Option<Duration>,
) -> Result<StopReason, anyhow::Error> {
    loop {
        if session.auto_stop_due() {
            session.stop(StopReason::Timed);
            tracing::info!("Recording auto-stopped after configured duration");
            break;
        }

        match prompt.poll_command(POLL_INTERVAL)? {
            RecordingCommand::Continue => {
                prompt.render_elapsed(session.elapsed(), auto_stop);
            }
            RecordingCommand::Stop => {
                session.stop(StopReason::Manual);
                break;
            }
            RecordingCommand::PowerStop => {
                session.stop(StopReason::Power);
                break;
            }
        }
    }

    session
        .stop_reason()
        .ok_or_else(|| anyhow::anyhow!("Recording loop ended without a stop reason"))
}
