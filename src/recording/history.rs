//! Recording history for replay and submit-last functionality.
//!
//! Stores one small JSON metadata file per recording in the data directory
//! so recordings can be replayed or submitted later. Only the 10 most
//! recent recordings are kept; older audio and metadata are deleted.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of recordings kept before the oldest is evicted.
const MAX_RECORDINGS: usize = 10;

/// Data directory where recordings and their history live:
/// `~/.local/share/singmatch`. Created on first use.
pub fn data_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("singmatch");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Metadata about a recorded session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// Unique identifier for this recording session
    pub id: String,
    /// Path to the audio file
    pub audio_path: PathBuf,
    /// Song key the recording was made for, if one was configured
    pub song_key: Option<String>,
    /// Timestamp when recording was created
    pub created_at: DateTime<Local>,
}

/// Manages recording history in a directory of JSON metadata files.
pub struct RecordingHistory {
    history_dir: PathBuf,
}

impl RecordingHistory {
    /// Creates a recording history manager rooted in the given data directory.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let history_dir = data_dir.join("recording_history");
        fs::create_dir_all(&history_dir)?;
        Ok(Self { history_dir })
    }

    /// Saves metadata for a new recording, evicting the oldest entry (and
    /// its audio file) when the history is full.
    ///
    /// Each recording keeps its own audio file, so eviction can never touch
    /// the file that was just saved.
    pub fn save_recording(&self, audio_path: PathBuf, song_key: Option<String>) -> Result<String> {
        self.evict_if_full()?;

        let now = Local::now();
        let mut recording_id = now.timestamp_millis().to_string();
        let mut metadata_path = self.history_dir.join(format!("{}.json", recording_id));

        // Back-to-back saves can land in the same millisecond
        let mut bump = 0u32;
        while metadata_path.exists() {
            bump += 1;
            recording_id = format!("{}-{}", now.timestamp_millis(), bump);
            metadata_path = self.history_dir.join(format!("{}.json", recording_id));
        }

        let metadata = RecordingMetadata {
            id: recording_id.clone(),
            audio_path,
            song_key,
            created_at: now,
        };

        let json = serde_json::to_string_pretty(&metadata)?;
        fs::write(metadata_path, json)?;
        tracing::info!("Recording metadata saved with ID: {}", recording_id);

        Ok(recording_id)
    }

    /// Retrieves the most recent recording metadata.
    pub fn last_recording(&self) -> Result<Option<RecordingMetadata>> {
        Ok(self.list_recordings()?.into_iter().next())
    }

    /// Retrieves all recordings ordered most recent first.
    pub fn list_recordings(&self) -> Result<Vec<RecordingMetadata>> {
        let mut recordings: Vec<RecordingMetadata> = fs::read_dir(&self.history_dir)?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension().map(|ext| ext == "json").unwrap_or(false) {
                    let content = fs::read_to_string(&path).ok()?;
                    serde_json::from_str(&content).ok()
                } else {
                    None
                }
            })
            .collect();

        recordings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recordings)
    }

    /// Deletes the oldest recording when the history holds MAX_RECORDINGS
    /// entries, making room for one more.
    fn evict_if_full(&self) -> Result<()> {
        let recordings = self.list_recordings()?;
        if recordings.len() < MAX_RECORDINGS {
            return Ok(());
        }

        // list_recordings is newest-first, so the victim is at the back
        for oldest in recordings.iter().skip(MAX_RECORDINGS - 1) {
            if oldest.audio_path.exists() {
                if let Err(e) = fs::remove_file(&oldest.audio_path) {
                    tracing::warn!("Failed to delete old recording audio: {}", e);
                } else {
                    tracing::info!(
                        "Deleted old recording audio: {}",
                        oldest.audio_path.display()
                    );
                }
            }

            let metadata_path = self.history_dir.join(format!("{}.json", oldest.id));
            if let Err(e) = fs::remove_file(&metadata_path) {
                tracing::warn!("Failed to delete old recording metadata: {}", e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save_with_id(history: &RecordingHistory, id: &str, days_ago: i64, audio_path: PathBuf) {
        let metadata = RecordingMetadata {
            id: id.to_string(),
            audio_path,
            song_key: None,
            created_at: Local::now() - chrono::Duration::days(days_ago),
        };
        let path = history.history_dir.join(format!("{id}.json"));
        fs::write(path, serde_json::to_string_pretty(&metadata).unwrap()).unwrap();
    }

    #[test]
    fn empty_history_has_no_last_recording() {
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::new(dir.path()).unwrap();
        assert!(history.last_recording().unwrap().is_none());
    }

    #[test]
    fn recordings_are_listed_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::new(dir.path()).unwrap();
        save_with_id(&history, "a", 3, PathBuf::from("/tmp/a.wav"));
        save_with_id(&history, "b", 2, PathBuf::from("/tmp/b.wav"));
        save_with_id(&history, "c", 1, PathBuf::from("/tmp/c.wav"));

        let listed = history.list_recordings().unwrap();
        let ids: Vec<&str> = listed.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(history.last_recording().unwrap().unwrap().id, "c");
    }

    #[test]
    fn each_index_resolves_to_its_own_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::new(dir.path()).unwrap();
        for (i, id) in ["old", "mid", "new"].iter().enumerate() {
            let audio = dir.path().join(format!("recording_{id}.wav"));
            fs::write(&audio, b"RIFF").unwrap();
            save_with_id(&history, id, (3 - i) as i64, audio);
        }

        // Index 0 is the newest recording, each entry keeps its own file
        let listed = history.list_recordings().unwrap();
        assert_eq!(listed[0].audio_path, dir.path().join("recording_new.wav"));
        assert_eq!(listed[1].audio_path, dir.path().join("recording_mid.wav"));
        assert_eq!(listed[2].audio_path, dir.path().join("recording_old.wav"));
        assert!(listed.iter().all(|m| m.audio_path.exists()));
    }

    #[test]
    fn eviction_keeps_history_at_cap() {
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::new(dir.path()).unwrap();
        for i in 0..MAX_RECORDINGS {
            save_with_id(
                &history,
                &format!("r{i}"),
                (MAX_RECORDINGS - i) as i64,
                PathBuf::from(format!("/tmp/r{i}.wav")),
            );
        }

        let id = history
            .save_recording(PathBuf::from("/tmp/new.wav"), Some("eta".to_string()))
            .unwrap();

        let listed = history.list_recordings().unwrap();
        assert_eq!(listed.len(), MAX_RECORDINGS);
        assert_eq!(listed[0].id, id);
        // The oldest entry was evicted
        assert!(!listed.iter().any(|m| m.id == "r0"));
    }

    #[test]
    fn eviction_spares_the_newly_saved_audio() {
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::new(dir.path()).unwrap();

        // A full history with every audio file actually on disk
        for i in 0..MAX_RECORDINGS {
            let audio = dir.path().join(format!("recording_r{i}.wav"));
            fs::write(&audio, b"RIFF").unwrap();
            save_with_id(&history, &format!("r{i}"), (MAX_RECORDINGS - i) as i64, audio);
        }

        let new_audio = dir.path().join("recording_new.wav");
        fs::write(&new_audio, b"RIFF").unwrap();
        history.save_recording(new_audio.clone(), None).unwrap();

        // The just-saved audio survives; only the oldest file was deleted
        assert!(new_audio.exists());
        assert!(!dir.path().join("recording_r0.wav").exists());
        assert!(dir.path().join("recording_r9.wav").exists());
        assert!(history
            .last_recording()
            .unwrap()
            .unwrap()
            .audio_path
            .exists());
    }

    #[test]
    fn same_millisecond_saves_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::new(dir.path()).unwrap();

        let first = history
            .save_recording(PathBuf::from("/tmp/one.wav"), None)
            .unwrap();
        let second = history
            .save_recording(PathBuf::from("/tmp/two.wav"), None)
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(history.list_recordings().unwrap().len(), 2);
    }

    #[test]
    fn song_key_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let history = RecordingHistory::new(dir.path()).unwrap();
        history
            .save_recording(PathBuf::from("/tmp/take.wav"), Some("love_yonsei".to_string()))
            .unwrap();

        let last = history.last_recording().unwrap().unwrap();
        assert_eq!(last.song_key.as_deref(), Some("love_yonsei"));
    }
}
