//! Application command handlers for singmatch.
//!
//! This module organizes command handling into separate submodules, each responsible
//! for a specific application command.
//!
//! # Commands
//! - `record`: Microphone recording with timed/manual/power stop
//! - `submit`: Upload an audio file for comparison against a reference track
//! - `replay`: Play back a previous recording
//! - `songs`: List the configured reference tracks
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod list_devices;
pub mod logs;
pub mod record;
pub mod replay;
pub mod songs;
pub mod submit;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use record::handle_record;
pub use replay::handle_replay;
pub use songs::handle_songs;
pub use submit::handle_submit;
