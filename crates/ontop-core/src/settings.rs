use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::monitor::DEFAULT_POLL_INTERVAL;

pub const SETTINGS_FILE: &str = "settings.json";

/// Tunables for overlay behaviour, read from `settings.json` in the app
/// config directory. Every field has a default so partial files are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlaySettings {
    pub poll_interval_ms: u64,
    pub pointer_interval_ms: u64,
    pub header_grace_ms: u64,
    pub default_width: u32,
    pub default_height: u32,
    pub drag_handle_height: f64,
    pub resize_grip_size: f64,
    pub debug_logging: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            pointer_interval_ms: 50,
            header_grace_ms: 1000,
            default_width: 480,
            default_height: 720,
            drag_handle_height: 32.0,
            resize_grip_size: 18.0,
            debug_logging: false,
        }
    }
}

impl OverlaySettings {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or can't be parsed.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
                Self::default()
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn pointer_interval(&self) -> Duration {
        Duration::from_millis(self.pointer_interval_ms.max(1))
    }

    pub fn header_grace(&self) -> Duration {
        Duration::from_millis(self.header_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = OverlaySettings::load(&dir.path().join(SETTINGS_FILE));
        assert_eq!(settings, OverlaySettings::default());
        assert_eq!(settings.poll_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{ "pollIntervalMs": 250, "debugLogging": true }"#).unwrap();

        let settings = OverlaySettings::load(&path);
        assert_eq!(settings.poll_interval_ms, 250);
        assert!(settings.debug_logging);
        assert_eq!(settings.default_width, 480);
        assert_eq!(settings.header_grace(), Duration::from_millis(1000));
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(OverlaySettings::load(&path), OverlaySettings::default());
    }
}
