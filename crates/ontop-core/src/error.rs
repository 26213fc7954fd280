use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to create window {0}")]
    WindowCreation(String),
    #[error("Window {0} not found")]
    WindowNotFound(String),
    #[error("Window operation failed: {0}")]
    Platform(String),
    #[error("Overlay item {0} not found")]
    ItemNotFound(String),
    #[error("Overlay item {0} already exists")]
    DuplicateItem(String),
    #[error("Invalid overlay item: {0}")]
    InvalidItem(String),
    #[error("Failed to persist {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Startup registration failed: {0}")]
    Autostart(String),
    #[error("Tauri error: {0}")]
    TauriError(#[from] tauri::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl Error {
    /// Races against a window that has already gone away. These are dropped
    /// silently by the overlay machinery instead of reaching the user.
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::WindowNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_windows_are_stale() {
        assert!(Error::WindowNotFound("overlay-1-1".into()).is_stale());
        assert!(!Error::WindowCreation("overlay-1-1".into()).is_stale());
        assert!(!Error::ItemNotFound("1".into()).is_stale());
        assert!(!Error::Platform("cursor position unavailable".into()).is_stale());
    }

    #[test]
    fn persistence_error_names_the_file() {
        let err = Error::Persistence {
            path: PathBuf::from("/tmp/user-preferences.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("user-preferences.json"));
    }
}
