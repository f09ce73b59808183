//! Key-value backends for persisted diagrams.
//!
//! Keys follow the browser-era layout so existing data maps one to one:
//! the metadata index, one body per diagram, and one snapshot per version.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

const PREFIX: &str = "cloud-architecture";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// The list of [`crate::DiagramMetadata`].
    Index,
    Diagram(String),
    Version { diagram_id: String, version: u32 },
}

impl StoreKey {
    pub fn diagram(id: &str) -> Self {
        StoreKey::Diagram(id.to_string())
    }

    pub fn version(diagram_id: &str, version: u32) -> Self {
        StoreKey::Version {
            diagram_id: diagram_id.to_string(),
            version,
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKey::Index => write!(f, "{PREFIX}-designs"),
            StoreKey::Diagram(id) => write!(f, "{PREFIX}-design-{id}"),
            StoreKey::Version {
                diagram_id,
                version,
            } => write!(f, "{PREFIX}-version-{diagram_id}-{version}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage quota exceeded writing {key}: need {needed} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Byte-level storage. Writes replace the whole value.
pub trait Store {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&mut self, key: &StoreKey, value: &[u8]) -> Result<(), StoreError>;
    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &StoreKey) -> Result<(), StoreError>;
}

// --- Memory ---

/// In-process store with an optional byte quota, like browser local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    /// Bytes held across all keys and values.
    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(&key.to_string()).cloned())
    }

    fn set(&mut self, key: &StoreKey, value: &[u8]) -> Result<(), StoreError> {
        let key = key.to_string();
        if let Some(quota) = self.quota {
            let replaced = self.entries.get(&key).map_or(0, |old| key.len() + old.len());
            let available = quota.saturating_sub(self.used_bytes() - replaced);
            let needed = key.len() + value.len();
            if needed > available {
                return Err(StoreError::QuotaExceeded {
                    key,
                    needed,
                    available,
                });
            }
        }
        self.entries.insert(key, value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &StoreKey) -> Result<(), StoreError> {
        self.entries.remove(&key.to_string());
        Ok(())
    }
}

// --- Files ---

/// One JSON file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the default data directory (~/.stratus/diagrams).
    pub fn open_default() -> Self {
        Self::new(crate::data_dir().join("diagrams"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &StoreKey) -> Result<PathBuf, StoreError> {
        let name = key.to_string();
        if name.contains('/') || name.contains('\\') || name.starts_with('.') {
            return Err(StoreError::InvalidKey(name));
        }
        Ok(self.root.join(format!("{name}.json")))
    }
}

impl Store for FileStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &StoreKey, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;

        // Atomic write: temp file + rename
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &StoreKey) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
