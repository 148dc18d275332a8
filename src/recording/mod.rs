//! Audio recording feature for singmatch.
//!
//! Provides microphone capture, the recording session lifecycle (timed,
//! manual, and power stop), keyboard handling during recording, and the
//! recording history used by replay and submit.

pub mod alsa;
pub mod audio;
pub mod history;
pub mod session;
pub mod ui;

pub use audio::AudioRecorder;
pub use history::{RecordingHistory, RecordingMetadata};
pub use session::{RecordingSession, StopReason};
pub use ui::{RecordingCommand, RecordingPrompt};
