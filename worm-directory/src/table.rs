//! Static name table.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs;
use tracing::{debug, info, instrument};

use worm_core::error::{Result, WormError};
use worm_core::traits::Directory;
use worm_core::types::{normalize_name, Resolution};

/// Directory backed by an in-memory table.
///
/// # File Format
///
/// ```json
/// {
///   "node.amalgam": { "endpoint": "127.0.0.1:8080", "transport": "tcp" },
///   "node.tor": { "endpoint": "someonionaddress.onion", "transport": "tor" }
/// }
/// ```
///
/// Names are matched case-insensitively. An entry with an empty endpoint
/// counts as absent.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    entries: RwLock<HashMap<String, Resolution>>,
}

impl StaticDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory from `(name, resolution)` pairs.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Resolution)>,
        S: AsRef<str>,
    {
        let directory = Self::new();
        for (name, resolution) in entries {
            directory.insert(name.as_ref(), resolution);
        }
        directory
    }

    /// Parses a directory from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: BTreeMap<String, Resolution> = serde_json::from_str(json)?;
        Ok(Self::from_entries(table))
    }

    /// Loads a directory from a JSON file.
    #[instrument]
    pub async fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).await.map_err(|e| {
            WormError::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to read directory file {}: {}", path.display(), e),
            ))
        })?;

        let directory = Self::from_json_str(&json)?;
        info!(entries = directory.len(), "Loaded directory");
        Ok(directory)
    }

    /// Adds or replaces the entry for `name`.
    pub fn insert(&self, name: &str, resolution: Resolution) -> Option<Resolution> {
        self.entries.write().insert(normalize_name(name), resolution)
    }

    /// Removes the entry for `name`.
    pub fn remove(&self, name: &str) -> Option<Resolution> {
        self.entries.write().remove(&normalize_name(name))
    }

    /// Returns the entry for `name` without going through the trait.
    pub fn lookup(&self, name: &str) -> Option<Resolution> {
        self.entries
            .read()
            .get(&normalize_name(name))
            .filter(|resolution| !resolution.endpoint.is_empty())
            .cloned()
    }

    /// Known names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn resolve(&self, name: &str) -> Result<Option<Resolution>> {
        let found = self.lookup(name);
        debug!(name, found = found.is_some(), "Directory lookup");
        Ok(found)
    }
}
