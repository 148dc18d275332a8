//! Recording session lifecycle.
//!
//! A session exists only while a recording is active. It owns the capture
//! stream, the optional auto-stop deadline, and the stop reason. All stop
//! paths funnel through one idempotent `stop`, so a timed stop racing a
//! manual keypress cannot stop the stream twice or overwrite the reason
//! the recording ended.

use super::audio::AudioRecorder;
use crate::config::AudioConfig;
use anyhow::Result;
use std::path::Path;
use std::time::{Duration, Instant};

/// Why a recording ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured duration elapsed
    Timed,
    /// The user stopped the recording (Enter/Space)
    Manual,
    /// The user broke the recording off (Escape/q)
    Power,
}

impl StopReason {
    /// Whether the normal completion notice is suppressed in favor of the
    /// "interrupted" notice.
    pub fn is_interrupted(self) -> bool {
        matches!(self, StopReason::Power)
    }
}

/// Lifecycle state of a session, independent of the audio device.
///
/// Kept separate from the capture stream so the stop semantics can be
/// exercised without a microphone.
#[derive(Debug)]
pub struct SessionState {
    started_at: Instant,
    deadline: Option<Instant>,
    stop_reason: Option<StopReason>,
}

impl SessionState {
    /// Creates an active state, computing the auto-stop deadline if a
    /// duration is configured. No duration means the session only ends on
    /// a manual or power stop.
    pub fn new(auto_stop: Option<Duration>) -> Self {
        let started_at = Instant::now();
        Self {
            started_at,
            deadline: auto_stop.map(|d| started_at + d),
            stop_reason: None,
        }
    }

    /// Whether the session is still recording.
    pub fn is_active(&self) -> bool {
        self.stop_reason.is_none()
    }

    /// Whether the auto-stop deadline has passed for a still-active session.
    pub fn auto_stop_due(&self, now: Instant) -> bool {
        self.is_active() && self.deadline.is_some_and(|d| now >= d)
    }

    /// Marks the session stopped. Returns true on the first stop only;
    /// later calls leave the original reason in place.
    pub fn stop(&mut self, reason: StopReason) -> bool {
        if self.stop_reason.is_some() {
            return false;
        }
        self.stop_reason = Some(reason);
        true
    }

    /// The reason the session ended, once stopped.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// An active recording: capture stream plus lifecycle state.
///
/// At most one session exists at a time; the record command owns it for the
/// duration of the recording and consumes it on save.
pub struct RecordingSession {
    recorder: AudioRecorder,
    state: SessionState,
}

impl RecordingSession {
    /// Opens the input device and starts capturing.
    ///
    /// # Errors
    /// - If the device cannot be opened (missing device, busy, no permission)
    pub fn start(audio: &AudioConfig, auto_stop: Option<Duration>) -> Result<Self> {
        let mut recorder = AudioRecorder::new(audio.sample_rate, audio.device.clone());
        recorder.start()?;

        tracing::info!(
            "Recording session started (auto-stop: {})",
            match auto_stop {
                Some(d) => format!("{}ms", d.as_millis()),
                None => "disabled".to_string(),
            }
        );

        Ok(Self {
            recorder,
            state: SessionState::new(auto_stop),
        })
    }

    /// Whether the auto-stop deadline has passed.
    pub fn auto_stop_due(&self) -> bool {
        self.state.auto_stop_due(Instant::now())
    }

    /// Stops capturing. Idempotent; returns true on the first stop.
    pub fn stop(&mut self, reason: StopReason) -> bool {
        if self.state.stop(reason) {
            self.recorder.halt();
            tracing::info!(
                "Recording stopped after {:.1}s ({:?})",
                self.state.elapsed().as_secs_f32(),
                reason
            );
            true
        } else {
            false
        }
    }

    /// The reason the session ended, once stopped.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.state.stop_reason()
    }

    /// Time since the recording started.
    pub fn elapsed(&self) -> Duration {
        self.state.elapsed()
    }

    /// Number of samples captured so far.
    pub fn sample_count(&self) -> usize {
        self.recorder.sample_count()
    }

    /// Actual capture sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.recorder.sample_rate()
    }

    /// Consumes the session and writes the concatenated audio to a WAV file.
    ///
    /// Returns false without writing anything when no samples were captured.
    ///
    /// # Errors
    /// - If the WAV file cannot be written
    pub fn save(mut self, path: &Path) -> Result<bool> {
        // A still-active session is treated as manually stopped
        self.stop(StopReason::Manual);

        if self.recorder.sample_count() == 0 {
            tracing::warn!("Recording ended with no samples captured");
            return Ok(false);
        }

        self.recorder.save_wav(path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_active() {
        let state = SessionState::new(Some(Duration::from_millis(3000)));
        assert!(state.is_active());
        assert!(state.stop_reason().is_none());
    }

    #[test]
    fn deadline_elapse_triggers_auto_stop() {
        let state = SessionState::new(Some(Duration::from_millis(3000)));
        let now = Instant::now();
        assert!(!state.auto_stop_due(now));
        assert!(state.auto_stop_due(now + Duration::from_millis(3000)));
        assert!(state.auto_stop_due(now + Duration::from_secs(60)));
    }

    #[test]
    fn no_duration_never_auto_stops() {
        let state = SessionState::new(None);
        let now = Instant::now();
        assert!(!state.auto_stop_due(now + Duration::from_secs(3600)));
    }

    #[test]
    fn first_stop_wins() {
        let mut state = SessionState::new(None);
        assert!(state.stop(StopReason::Power));
        assert!(!state.stop(StopReason::Timed));
        assert_eq!(state.stop_reason(), Some(StopReason::Power));
    }

    #[test]
    fn stopped_session_ignores_deadline() {
        let mut state = SessionState::new(Some(Duration::from_millis(1)));
        state.stop(StopReason::Manual);
        assert!(!state.auto_stop_due(Instant::now() + Duration::from_secs(1)));
    }

    #[test]
    fn saving_an_empty_capture_writes_nothing() {
        let session = RecordingSession {
            recorder: AudioRecorder::new(16000, "default".to_string()),
            state: SessionState::new(None),
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");

        assert!(!session.save(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn power_stop_is_interrupted() {
        assert!(StopReason::Power.is_interrupted());
        assert!(!StopReason::Timed.is_interrupted());
        assert!(!StopReason::Manual.is_interrupted());
    }
}
