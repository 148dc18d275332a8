//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use anyhow::anyhow;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// Checks if setup is needed (version mismatch or missing config) and runs setup if required.
///
/// This is called early in the startup sequence, before command handling.
/// It checks:
/// 1. If config file doesn't exist, runs full setup
/// 2. If config version is older than app version, runs setup and logs migration
/// 3. If config version matches app version, does nothing
async fn check_and_run_setup() -> Result<(), anyhow::Error> {
    let config_path = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("singmatch")
        .join("singmatch.toml");

    match crate::setup::version::check_setup_needed(&config_path)? {
        Some(old_version) => {
            tracing::info!(
                "Setup needed - migrating from version {} to {}",
                old_version,
                env!("CARGO_PKG_VERSION")
            );
            crate::setup::run_setup().map_err(|e| {
                tracing::error!("Setup failed: {e}");
                anyhow!("Setup failed: {e}")
            })?;
            crate::setup::version::update_config_version(&config_path).map_err(|e| {
                tracing::error!("Failed to update config version: {e}");
                anyhow!("Failed to update config version: {e}")
            })?;
            tracing::info!(
                "Setup completed successfully - migrated to version {}",
                env!("CARGO_PKG_VERSION")
            );
        }
        None => {
            tracing::debug!("Config version up to date ({})", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// A terminal client for a sing-along similarity service
#[derive(Parser)]
#[command(name = "singmatch")]
#[command(version)]
#[command(about = "Record or upload audio and compare it against a reference song")]
#[command(
    long_about = "singmatch records audio from your microphone (or takes an existing\naudio file) and submits it to a comparison server, which scores how\nclose the performance is to a reference track and answers with a\nresult page.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n\nEXAMPLES:\n    # Record until the configured duration elapses (Enter stops early)\n    $ singmatch\n    $ singmatch record\n\n    # Record and play the result back afterwards\n    $ singmatch record --play\n\n    # Submit the most recent recording\n    $ singmatch submit\n\n    # Submit a file against a specific reference track\n    $ singmatch submit take3.wav --song-key eta\n\n    # Submit and open the result page in the browser\n    $ singmatch submit take3.wav --open\n\n    # List the reference tracks the client knows about\n    $ singmatch songs"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/singmatch/singmatch.toml\n    Logs:               ~/.local/state/singmatch/singmatch.log.*\n    Recordings:         ~/.local/share/singmatch/"
)]
struct Cli {
    /// Play the recording back after it is saved (record default command)
    #[arg(short, long, global = true)]
    play: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record audio from the microphone (default)
    ///
    /// Recording stops on its own after the configured duration.
    /// Press Enter or Space to stop early, Escape/q to break it off.
    #[command(visible_alias = "r")]
    Record {
        /// Play the recording back after it is saved
        #[arg(short, long)]
        play: bool,
    },

    /// Submit an audio file for comparison
    ///
    /// Uploads the file to the comparison server together with a song key
    /// and reports the similarity score and result page. With no FILE, the
    /// most recent recording is submitted.
    #[command(visible_alias = "s")]
    Submit {
        /// Path to the audio file to submit (defaults to the last recording)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Reference track to compare against (see 'singmatch songs')
        #[arg(short, long, value_name = "KEY")]
        song_key: Option<String>,

        /// Open the result page in the system browser
        #[arg(short, long)]
        open: bool,
    },

    /// Replay a previous recording using system audio player
    ///
    /// Play back the audio of a previous recording without submitting it.
    #[command(visible_alias = "rp")]
    Replay {
        /// Recording index (1 = most recent, 2 = second most recent, etc.)
        #[arg(value_name = "N")]
        index: Option<usize>,
    },

    /// List the reference tracks configured for comparison
    Songs,

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio settings, the server endpoint, and song keys.
    /// Uses $EDITOR environment variable or falls back to nano/vim.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in singmatch.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   singmatch completions bash > singmatch.bash
    ///   singmatch completions zsh > _singmatch
    ///   singmatch completions fish > singmatch.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails (e.g., recording, submission, playback)
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "singmatch", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    // Check if setup is needed (version check or missing config)
    check_and_run_setup().await?;

    // Route to appropriate command handler
    match cli.command {
        None | Some(Commands::Record { .. }) => {
            // Default command is record
            // If both are specified, the explicit record command option takes precedence
            let play = match cli.command {
                Some(Commands::Record { play }) => play,
                None => cli.play,
                _ => unreachable!(),
            };
            commands::handle_record(play).await?;
        }
        Some(Commands::Submit {
            file,
            song_key,
            open,
        }) => {
            commands::handle_submit(file, song_key, open).await?;
        }
        Some(Commands::Replay { index }) => {
            commands::handle_replay(index).await?;
        }
        Some(Commands::Songs) => {
            commands::handle_songs()?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
