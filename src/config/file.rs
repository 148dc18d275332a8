//! Configuration file management for singmatch.
//!
//! This module handles loading and saving application configuration from TOML files.
//! Configuration is stored in the user's config directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `singmatch list-devices`
    /// - device name from `singmatch list-devices`
    pub device: String,
    /// Recording sample rate in Hz (device native rate wins if they differ)
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            sample_rate: 16000,
        }
    }
}

/// Recording lifecycle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Auto-stop the recording after this many milliseconds.
    /// Absent or zero means the recording only ends on a manual stop.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl RecordingConfig {
    /// Returns the auto-stop duration, treating a zero value as disabled.
    pub fn auto_stop(&self) -> Option<Duration> {
        match self.duration_ms {
            Some(0) | None => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        }
    }
}

/// Comparison server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Comparison endpoint the audio is POSTed to
    pub endpoint: String,
    /// Give up on a submission after this many seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/compare".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Reference track configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongsConfig {
    /// Song key sent when none is given on the command line
    #[serde(default)]
    pub default_key: Option<String>,
    /// Reference tracks the server knows about
    #[serde(default = "default_song_keys")]
    pub keys: Vec<String>,
}

fn default_song_keys() -> Vec<String> {
    vec![
        "little_star".to_string(),
        "eta".to_string(),
        "love_yonsei".to_string(),
    ]
}

impl Default for SongsConfig {
    fn default() -> Self {
        Self {
            default_key: Some("little_star".to_string()),
            keys: default_song_keys(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SingmatchConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub songs: SongsConfig,
}

impl SingmatchConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        let config_content = fs::read_to_string(&config_path)?;
        let config: SingmatchConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    #[allow(dead_code)]
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file.
///
/// Assumes the config file exists (created by setup if needed).
///
/// # Errors
/// - If the config directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let config_dir = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        )
    })?;
    let config_path = config_dir
        .join(".config")
        .join("singmatch")
        .join("singmatch.toml");

    std::fs::create_dir_all(config_path.parent().unwrap())?;

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_service() {
        let config = SingmatchConfig::default();
        assert_eq!(config.server.endpoint, "http://127.0.0.1:5000/compare");
        assert_eq!(config.server.timeout_secs, 60);
        assert_eq!(config.audio.device, "default");
        assert_eq!(
            config.songs.keys,
            vec!["little_star", "eta", "love_yonsei"]
        );
    }

    #[test]
    fn empty_toml_falls_back_to_defaults() {
        let config: SingmatchConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.endpoint, "http://127.0.0.1:5000/compare");
        assert!(config.recording.duration_ms.is_none());
    }

    #[test]
    fn auto_stop_disabled_when_missing_or_zero() {
        let missing = RecordingConfig { duration_ms: None };
        assert!(missing.auto_stop().is_none());

        let zero = RecordingConfig {
            duration_ms: Some(0),
        };
        assert!(zero.auto_stop().is_none());

        let set = RecordingConfig {
            duration_ms: Some(3000),
        };
        assert_eq!(set.auto_stop(), Some(Duration::from_millis(3000)));
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let mut config = SingmatchConfig::default();
        config.recording.duration_ms = Some(3000);
        config.songs.default_key = Some("eta".to_string());

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: SingmatchConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.recording.duration_ms, Some(3000));
        assert_eq!(parsed.songs.default_key.as_deref(), Some("eta"));
        assert_eq!(parsed.server.endpoint, config.server.endpoint);
    }
}
