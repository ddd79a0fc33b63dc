//! Platform configuration and data paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/booking-probe/` and `~/.local/share/booking-probe/`
//! - macOS: `~/Library/Application Support/booking-probe/`
//! - Windows: `%APPDATA%\booking-probe\`

use std::path::PathBuf;

/// Application name used for all platform directories
const APP_NAME: &str = "booking-probe";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("logs"))
}

/// Default location for `--log-file` when given without a value
pub fn default_log_file() -> Option<PathBuf> {
    log_dir().map(|d| d.join("probe.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_toml() {
        if let Some(path) = config_path() {
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
            assert!(path.to_string_lossy().contains(APP_NAME));
        }
    }

    #[test]
    fn test_log_file_lives_in_log_dir() {
        if let (Some(dir), Some(file)) = (log_dir(), default_log_file()) {
            assert_eq!(file.parent(), Some(dir.as_path()));
        }
    }
}
