//! Structured logging for singmatch using the tracing crate.
//!
//! Configures a rolling file logger that writes to daily-rotated log files
//! under the XDG state directory. Nothing is written to the terminal, so
//! command output stays clean for piping. Old log files are pruned at
//! startup, keeping only the 7 most recent days.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

/// Days of daily-rotated log files kept on disk.
const MAX_LOG_DAYS: usize = 7;

/// Global non-blocking guard holder to keep the appender alive for the program lifetime.
static APPENDER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initializes the logging system with file-based output.
///
/// Sets up a non-blocking rolling file appender that rotates daily.
/// Log level is controlled by the RUST_LOG environment variable (defaults to "info").
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If the subscriber initialization fails
pub fn init_logging() -> Result<(), anyhow::Error> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    // Prune old log files before the new appender starts writing
    if let Err(e) = prune_old_logs(&log_dir) {
        eprintln!("Warning: Failed to cleanup old logs: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "singmatch.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Store the guard in a static to keep it alive for the program lifetime
    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging initialized. Log file: {}", log_dir.display());
    Ok(())
}

/// The log directory, following the XDG Base Directory Specification:
/// `$XDG_STATE_HOME/singmatch`, or `~/.local/state/singmatch`.
///
/// Does not create the directory, so callers can report "no logs yet".
///
/// # Errors
/// - If the home directory cannot be determined
pub fn log_dir() -> Result<PathBuf, anyhow::Error> {
    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg_state).join("singmatch"));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".local/state/singmatch"))
}

/// Deletes dated log files beyond the newest MAX_LOG_DAYS.
///
/// The appender names files `singmatch.log.YYYY-MM-DD`, so the date suffix
/// sorts lexicographically; no filesystem timestamps are needed.
fn prune_old_logs(log_dir: &Path) -> Result<(), anyhow::Error> {
    let mut dated_logs: Vec<String> = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let name = entry.ok()?.file_name().into_string().ok()?;
            let is_dated = name
                .strip_prefix("singmatch.log.")
                .is_some_and(|suffix| suffix.len() == "YYYY-MM-DD".len());
            is_dated.then_some(name)
        })
        .collect();

    // Newest first
    dated_logs.sort_unstable_by(|a, b| b.cmp(a));

    for name in dated_logs.iter().skip(MAX_LOG_DAYS) {
        let path = log_dir.join(name);
        if let Err(e) = fs::remove_file(&path) {
            tracing::warn!("Failed to delete old log file {}: {}", path.display(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn prune_keeps_only_the_newest_days() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=9 {
            touch(dir.path(), &format!("singmatch.log.2026-08-{day:02}"));
        }

        prune_old_logs(dir.path()).unwrap();

        let remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(remaining.len(), MAX_LOG_DAYS);
        // The two oldest days are gone
        assert!(!remaining.contains(&"singmatch.log.2026-08-01".to_string()));
        assert!(!remaining.contains(&"singmatch.log.2026-08-02".to_string()));
        assert!(remaining.contains(&"singmatch.log.2026-08-09".to_string()));
    }

    #[test]
    fn prune_ignores_undated_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "singmatch.log");
        touch(dir.path(), "notes.txt");
        for day in 1..=8 {
            touch(dir.path(), &format!("singmatch.log.2026-08-{day:02}"));
        }

        prune_old_logs(dir.path()).unwrap();

        assert!(dir.path().join("singmatch.log").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir.path().join("singmatch.log.2026-08-01").exists());
    }
}
