//! Keyboard handling and status display during recording.
//!
//! Puts the terminal in raw mode for the lifetime of the prompt, polls for
//! keypresses without blocking the recording loop, and keeps a single status
//! line up to date with the elapsed time.

use console::style;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::io::{self, Write};
use std::time::Duration;

/// User input command during recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingCommand {
    /// Continue recording (no relevant key pressed)
    Continue,
    /// Stop the recording (Enter or Space)
    Stop,
    /// Break the recording off (Escape or 'q')
    PowerStop,
}

/// Raw-mode keyboard prompt shown while a recording is active.
///
/// Raw mode is released in `Drop`, so an error path can't leave the
/// terminal unusable.
pub struct RecordingPrompt {
    raw_mode: bool,
}

impl RecordingPrompt {
    /// Enables raw mode and prints the key hints.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;

        let hints = format!(
            "{}  {} stop and save   {} break off",
            style("● REC").red().bold(),
            style("[Enter/Space]").dim(),
            style("[Esc/q]").dim(),
        );
        print!("{hints}\r\n");
        io::stdout().flush()?;

        Ok(Self { raw_mode: true })
    }

    /// Polls for a keypress, waiting at most `timeout`.
    ///
    /// Returns `Continue` when no relevant key arrives within the timeout,
    /// so the caller's loop can check the auto-stop deadline.
    ///
    /// # Errors
    /// - If reading terminal events fails
    pub fn poll_command(&self, timeout: Duration) -> anyhow::Result<RecordingCommand> {
        if !event::poll(timeout)? {
            return Ok(RecordingCommand::Continue);
        }

        if let Event::Key(key) = event::read()? {
            // Ignore key release events on platforms that report them
            if key.kind != KeyEventKind::Press {
                return Ok(RecordingCommand::Continue);
            }

            return Ok(match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => RecordingCommand::Stop,
                KeyCode::Esc | KeyCode::Char('q') => RecordingCommand::PowerStop,
                _ => RecordingCommand::Continue,
            });
        }

        Ok(RecordingCommand::Continue)
    }

    /// Redraws the elapsed-time status line in place.
    pub fn render_elapsed(&self, elapsed: Duration, auto_stop: Option<Duration>) {
        let line = match auto_stop {
            Some(limit) => format!(
                "  {:.1}s / {:.1}s",
                elapsed.as_secs_f32(),
                limit.as_secs_f32()
            ),
            None => format!("  {:.1}s", elapsed.as_secs_f32()),
        };
        print!("\r{}", style(line).dim());
        let _ = io::stdout().flush();
    }

    /// Leaves raw mode and moves past the status line.
    pub fn finish(&mut self) {
        if self.raw_mode {
            let _ = disable_raw_mode();
            self.raw_mode = false;
            println!();
        }
    }
}

impl Drop for RecordingPrompt {
    fn drop(&mut self) {
        self.finish();
    }
}
