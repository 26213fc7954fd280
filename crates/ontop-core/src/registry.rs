//! Overlay registry: the persisted list of pinned URLs.
//!
//! The whole list lives in one JSON document that is read once at startup and
//! rewritten in full after every mutation. A missing or corrupt document is
//! not fatal; the registry simply starts empty.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::Error;

pub const STORE_FILE: &str = "user-preferences.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayItem {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Item as submitted by the UI, before it has an id.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewOverlayItem {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SizePreset {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

pub const SIZE_PRESETS: &[SizePreset] = &[
    SizePreset { name: "480p (854x480)", width: 854, height: 480 },
    SizePreset { name: "720p (1280x720)", width: 1280, height: 720 },
    SizePreset { name: "1080p (1920x1080)", width: 1920, height: 1080 },
    SizePreset { name: "1440p (2560x1440)", width: 2560, height: 1440 },
    SizePreset { name: "4K (3840x2160)", width: 3840, height: 2160 },
    SizePreset { name: "Square (1080x1080)", width: 1080, height: 1080 },
    SizePreset { name: "Portrait (1080x1920)", width: 1080, height: 1920 },
];

#[derive(Serialize, Deserialize, Debug, Default)]
struct StoreDocument {
    #[serde(default)]
    urls: Vec<OverlayItem>,
}

/// Prefix `https://` unless the URL already carries an http(s) scheme.
pub fn normalize_url(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidItem("URL is empty".to_string()));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{}", trimmed))
    }
}

pub struct OverlayRegistry {
    path: PathBuf,
    items: Vec<OverlayItem>,
    dirty: bool,
}

impl OverlayRegistry {
    /// Open the store at `path`. Read failures degrade to an empty list.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<StoreDocument>(&content) {
                Ok(doc) => doc.urls,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt overlay store, starting empty");
                    Vec::new()
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no overlay store, starting empty");
                Vec::new()
            }
        };

        Self {
            path,
            items,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list_items(&self) -> Vec<OverlayItem> {
        self.items.clone()
    }

    pub fn get(&self, id: &str) -> Option<&OverlayItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// True when the last write failed and the file is behind memory.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Append `item`. Its id must not be in use yet.
    pub fn add_item(&mut self, mut item: OverlayItem) -> Result<Vec<OverlayItem>, Error> {
        if item.id.trim().is_empty() {
            return Err(Error::InvalidItem("id is empty".to_string()));
        }
        if self.get(&item.id).is_some() {
            return Err(Error::DuplicateItem(item.id));
        }
        if item.width == 0 || item.height == 0 {
            return Err(Error::InvalidItem(
                "width and height must be positive".to_string(),
            ));
        }

        item.url = normalize_url(&item.url)?;
        item.name = item
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        self.items.push(item);
        self.persist()?;
        Ok(self.list_items())
    }

    /// Build an item from UI input with a fresh id and add it.
    pub fn create_item(&mut self, new: NewOverlayItem) -> Result<OverlayItem, Error> {
        let item = OverlayItem {
            id: self.generate_id(),
            url: new.url,
            name: new.name,
            width: new.width,
            height: new.height,
        };
        let id = item.id.clone();
        self.add_item(item)?;
        self.get(&id)
            .cloned()
            .ok_or(Error::ItemNotFound(id))
    }

    pub fn remove_item(&mut self, id: &str) -> Result<Vec<OverlayItem>, Error> {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() == before {
            return Err(Error::ItemNotFound(id.to_string()));
        }

        self.persist()?;
        Ok(self.list_items())
    }

    pub fn update_size(
        &mut self,
        id: &str,
        width: u32,
        height: u32,
    ) -> Result<Vec<OverlayItem>, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidItem(
                "width and height must be positive".to_string(),
            ));
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))?;

        if item.width == width && item.height == height && !self.dirty {
            return Ok(self.list_items());
        }

        item.width = width;
        item.height = height;
        self.persist()?;
        Ok(self.list_items())
    }

    /// Millisecond timestamp, bumped until it is unused.
    pub fn generate_id(&self) -> String {
        let mut candidate = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// The single write path. Writes to a sibling temp file and renames it
    /// over the store so a crash never leaves a half-written document.
    fn persist(&mut self) -> Result<(), Error> {
        match self.write_document() {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                error!(path = %self.path.display(), error = %e, "failed to save overlay store");
                Err(e)
            }
        }
    }

    fn write_document(&self) -> Result<(), Error> {
        let doc = StoreDocument {
            urls: self.items.clone(),
        };
        let json = serde_json::to_string_pretty(&doc)?;

        let persistence = |source: std::io::Error| Error::Persistence {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(persistence)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(persistence)?;
        fs::rename(&tmp, &self.path).map_err(persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, width: u32, height: u32) -> OverlayItem {
        OverlayItem {
            id: id.to_string(),
            url: "https://example.com".to_string(),
            name: None,
            width,
            height,
        }
    }

    #[test]
    fn missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = OverlayRegistry::open(dir.path().join(STORE_FILE));
        assert!(registry.list_items().is_empty());
    }

    #[test]
    fn corrupt_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE);
        fs::write(&path, "{\"urls\": [ {\"id\": ").unwrap();
        let registry = OverlayRegistry::open(&path);
        assert!(registry.list_items().is_empty());
    }

    #[test]
    fn reads_document_written_by_earlier_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE);
        fs::write(
            &path,
            r#"{"urls":[{"id":"1","url":"https://twitch.tv","name":"","width":480,"height":720},
                        {"id":"2","url":"https://google.com"}]}"#,
        )
        .unwrap();

        let registry = OverlayRegistry::open(&path);
        let items = registry.list_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].width, 480);
        assert_eq!(items[1].width, 0);
    }

    #[test]
    fn mutations_are_written_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE);

        let mut registry = OverlayRegistry::open(&path);
        registry.add_item(item("1", 1920, 1080)).unwrap();
        registry.add_item(item("2", 480, 720)).unwrap();
        registry.remove_item("2").unwrap();
        registry.update_size("1", 960, 540).unwrap();

        let reopened = OverlayRegistry::open(&path);
        assert_eq!(reopened.list_items(), vec![item("1", 960, 540)]);
    }

    #[test]
    fn add_normalizes_url_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = OverlayRegistry::open(dir.path().join(STORE_FILE));

        let mut raw = item("1", 480, 720);
        raw.url = "  twitch.tv/somebody ".to_string();
        raw.name = Some("   ".to_string());
        let items = registry.add_item(raw).unwrap();

        assert_eq!(items[0].url, "https://twitch.tv/somebody");
        assert_eq!(items[0].name, None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = OverlayRegistry::open(dir.path().join(STORE_FILE));
        registry.add_item(item("1", 480, 720)).unwrap();
        assert!(matches!(
            registry.add_item(item("1", 480, 720)),
            Err(Error::DuplicateItem(_))
        ));
        assert_eq!(registry.list_items().len(), 1);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = OverlayRegistry::open(dir.path().join(STORE_FILE));
        assert!(matches!(
            registry.add_item(item("1", 0, 720)),
            Err(Error::InvalidItem(_))
        ));
        registry.add_item(item("1", 480, 720)).unwrap();
        assert!(registry.update_size("1", 480, 0).is_err());
    }

    #[test]
    fn unknown_ids_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = OverlayRegistry::open(dir.path().join(STORE_FILE));
        assert!(matches!(
            registry.remove_item("nope"),
            Err(Error::ItemNotFound(_))
        ));
        assert!(matches!(
            registry.update_size("nope", 10, 10),
            Err(Error::ItemNotFound(_))
        ));
    }

    #[test]
    fn created_items_get_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = OverlayRegistry::open(dir.path().join(STORE_FILE));
        let new = NewOverlayItem {
            url: "example.com".to_string(),
            name: Some("Example".to_string()),
            width: 480,
            height: 720,
        };
        let a = registry.create_item(new.clone()).unwrap();
        let b = registry.create_item(new).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.name.as_deref(), Some("Example"));
    }

    #[test]
    fn failed_write_is_retried_by_next_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        // Parent "directory" is a file, so every write fails.
        let mut registry = OverlayRegistry::open(blocker.join(STORE_FILE));
        let result = registry.add_item(item("1", 480, 720));
        assert!(matches!(result, Err(Error::Persistence { .. })));
        assert!(registry.is_dirty());
        assert_eq!(registry.list_items().len(), 1);

        fs::remove_file(&blocker).unwrap();
        registry.update_size("1", 480, 720).unwrap();
        assert!(!registry.is_dirty());

        let reopened = OverlayRegistry::open(blocker.join(STORE_FILE));
        assert_eq!(reopened.list_items(), vec![item("1", 480, 720)]);
    }
}
