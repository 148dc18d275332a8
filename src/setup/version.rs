//! Version comparison and migration logic.
//!
//! Decides whether setup must run by comparing the binary version with the
//! `config_version` stamped on the first line of the config file.

use anyhow::anyhow;
use regex::Regex;
use std::path::Path;

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parses "major.minor.patch" into a comparable tuple.
fn parse_version(version_str: &str) -> anyhow::Result<(u32, u32, u32)> {
    let parts: Vec<&str> = version_str.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(anyhow!(
            "Invalid version format: '{}'. Expected 'major.minor.patch'",
            version_str
        ));
    }

    let mut nums = [0u32; 3];
    for (i, part) in parts.iter().enumerate() {
        nums[i] = part
            .parse::<u32>()
            .map_err(|_| anyhow!("Invalid version component: '{part}'"))?;
    }

    Ok((nums[0], nums[1], nums[2]))
}

/// Reads the config version from the first line of the config file.
///
/// Expects the first line to match: `config_version = "X.Y.Z"`
///
/// # Errors
/// Returns an error if the file can't be read.
fn read_config_version(config_path: &Path) -> anyhow::Result<Option<String>> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(config_path)?;
    let first_line = match content.lines().next() {
        Some(line) => line,
        None => return Ok(None),
    };

    let regex = Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)""#)?;
    Ok(regex
        .captures(first_line)
        .map(|caps| caps[1].to_string()))
}

/// Determines if setup is needed by checking version and config file existence.
///
/// Setup is needed if:
/// 1. Config file doesn't exist, OR
/// 2. Config file exists but has no version (legacy config), OR
/// 3. Config file version is older than current version
///
/// Returns the version the config file was at (None means setup with no prior config,
/// when the file doesn't exist).
pub fn check_setup_needed(config_path: &Path) -> anyhow::Result<Option<String>> {
    if !config_path.exists() {
        return Ok(Some("none (first run)".to_string()));
    }

    match read_config_version(config_path)? {
        Some(config_version) => {
            let stamped = parse_version(&config_version)?;
            let current = parse_version(CURRENT_VERSION)?;

            if stamped < current {
                Ok(Some(config_version))
            } else {
                if stamped > current {
                    // Config written by a newer binary; don't block startup
                    tracing::warn!(
                        "Config version {} is newer than app version {}",
                        config_version,
                        CURRENT_VERSION
                    );
                }
                Ok(None)
            }
        }
        None => Ok(Some("unknown (legacy config)".to_string())),
    }
}

/// Adds or updates the config_version line as the first line of the config file.
///
/// Preserves all other content by filtering out any existing config_version
/// line and prepending the new one.
pub fn update_config_version(config_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(config_path)?;

    let lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().starts_with("config_version"))
        .collect();

    let version_line = format!(r#"config_version = "{}""#, CURRENT_VERSION);
    let new_content = if lines.is_empty() {
        version_line
    } else {
        format!("{}\n{}", version_line, lines.join("\n"))
    };

    std::fs::write(config_path, new_content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_three_part_versions() {
        assert_eq!(parse_version("0.1.0").unwrap(), (0, 1, 0));
        assert_eq!(parse_version("2.10.3").unwrap(), (2, 10, 3));
    }

    #[test]
    fn rejects_malformed_versions() {
        assert!(parse_version("0.1").is_err());
        assert!(parse_version("0.1.0.0").is_err());
        assert!(parse_version("sideways").is_err());
    }

    #[test]
    fn version_tuples_order_correctly() {
        assert!(parse_version("0.0.9").unwrap() < parse_version("0.1.0").unwrap());
        assert!(parse_version("0.1.0").unwrap() < parse_version("1.0.0").unwrap());
    }

    #[test]
    fn missing_config_triggers_setup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("singmatch.toml");
        let needed = check_setup_needed(&path).unwrap();
        assert!(needed.is_some());
    }

    #[test]
    fn stamped_current_version_skips_setup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("singmatch.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, r#"config_version = "{}""#, CURRENT_VERSION).unwrap();
        writeln!(f, "[audio]").unwrap();

        assert!(check_setup_needed(&path).unwrap().is_none());
    }

    #[test]
    fn update_replaces_existing_version_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("singmatch.toml");
        std::fs::write(&path, "config_version = \"0.0.1\"\n[audio]\ndevice = \"default\"\n")
            .unwrap();

        update_config_version(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let first_line = content.lines().next().unwrap();
        assert_eq!(
            first_line,
            format!(r#"config_version = "{}""#, CURRENT_VERSION)
        );
        assert!(content.contains("device = \"default\""));
        assert_eq!(content.matches("config_version").count(), 1);
    }
}
