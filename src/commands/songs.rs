//! List the reference tracks configured for comparison.

use crate::config::SingmatchConfig;

/// Prints the song keys the client knows about, marking the default.
///
/// # Errors
/// - If the configuration cannot be loaded
pub fn handle_songs() -> Result<(), anyhow::Error> {
    let config = SingmatchConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    if config.songs.keys.is_empty() {
        println!("No song keys configured.");
        println!("Add some under [songs] in ~/.config/singmatch/singmatch.toml.");
        return Ok(());
    }

    println!();
    println!("Reference tracks:");
    println!();

    for key in &config.songs.keys {
        let is_default = config.songs.default_key.as_deref() == Some(key.as_str());
        let default_indicator = if is_default { " [DEFAULT]" } else { "" };
        println!("  {key}{default_indicator}");
    }
    println!();

    Ok(())
}
