//! Durable diagrams and their version history.
//!
//! [`DiagramManager`] is the only writer of the metadata index and the
//! snapshot history. Every body it writes is paired with an index upsert in
//! the same call, and a failed call leaves both as they were.

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::interchange::{self, ImportError};
use crate::store::{Store, StoreError, StoreKey};
use crate::{Diagram, DiagramMetadata, DiagramVersion};

const INITIAL_VERSION: &str = "Initial version";
const AUTOSAVED: &str = "Autosaved";
const IMPORTED: &str = "Imported";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("diagram not found: {0}")]
    NotFound(String),
    #[error("version {version} of diagram {id} not found")]
    VersionNotFound { id: String, version: u32 },
    #[error("diagram {0} has never been saved")]
    NotSaved(String),
    #[error("stored record {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
    #[error("failed to encode diagram: {0}")]
    Encode(serde_json::Error),
    #[error(transparent)]
    Import(#[from] ImportError),
}

pub struct DiagramManager<S> {
    store: S,
}

impl<S: Store> DiagramManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Index entries, in the order they were first saved.
    pub fn list(&self) -> Result<Vec<DiagramMetadata>, PersistError> {
        Ok(self.read(&StoreKey::Index)?.unwrap_or_default())
    }

    pub fn contains(&self, id: &str) -> Result<bool, PersistError> {
        Ok(self.list()?.iter().any(|m| m.id == id))
    }

    /// Explicit save.
    ///
    /// A diagram not yet in the index is written as version 1. A saved one
    /// gets the next version after both the stored and in-memory counters.
    /// The in-memory diagram is only updated once every write succeeded.
    pub fn save(&mut self, diagram: &mut Diagram, description: Option<&str>) -> Result<u32, PersistError> {
        let index = self.list()?;
        let (version, label) = match index.iter().find(|m| m.id == diagram.id) {
            Some(existing) => (
                existing.current_version.max(diagram.version) + 1,
                description,
            ),
            None => (1, Some(description.unwrap_or(INITIAL_VERSION))),
        };

        let mut next = diagram.clone();
        next.version = version;
        next.autosaved = false;
        next.touch();
        self.commit(index, &next, label)?;

        info!(diagram_id = next.id.as_str(), version; "Saved diagram");
        *diagram = next;
        Ok(version)
    }

    /// Autosave a diagram that is already in the index.
    pub fn autosave(&mut self, diagram: &mut Diagram) -> Result<u32, PersistError> {
        let index = self.list()?;
        let Some(existing) = index.iter().find(|m| m.id == diagram.id) else {
            return Err(PersistError::NotSaved(diagram.id.clone()));
        };

        let mut next = diagram.clone();
        next.version = existing.current_version.max(diagram.version) + 1;
        next.autosaved = true;
        next.touch();
        self.commit(index, &next, Some(AUTOSAVED))?;

        info!(diagram_id = next.id.as_str(), version = next.version; "Autosaved diagram");
        let version = next.version;
        *diagram = next;
        Ok(version)
    }

    /// Write index, body and snapshot; undo the index and body on failure.
    ///
    /// A body that did not exist before the call is removed again, so a
    /// failed first save never leaves a body without an index entry.
    fn commit(
        &mut self,
        mut index: Vec<DiagramMetadata>,
        diagram: &Diagram,
        label: Option<&str>,
    ) -> Result<(), PersistError> {
        let body_key = StoreKey::diagram(&diagram.id);
        let previous_index = self.store.get(&StoreKey::Index)?;
        let previous_body = self.store.get(&body_key)?;

        let entry = DiagramMetadata::from(diagram);
        match index.iter_mut().find(|m| m.id == diagram.id) {
            Some(existing) => *existing = entry,
            None => index.push(entry),
        }
        let index_bytes = encode(&index)?;
        let body_bytes = encode(diagram)?;
        let snapshot_bytes = encode(&DiagramVersion::of(diagram, label))?;

        self.store.set(&StoreKey::Index, &index_bytes)?;
        let written = self
            .store
            .set(&body_key, &body_bytes)
            .and_then(|()| {
                self.store
                    .set(&StoreKey::version(&diagram.id, diagram.version), &snapshot_bytes)
            });

        if let Err(err) = written {
            warn!(diagram_id = diagram.id.as_str(), error:% = err; "Save failed, restoring previous state");
            self.restore(&StoreKey::Index, previous_index.as_deref());
            self.restore(&body_key, previous_body.as_deref());
            return Err(err.into());
        }
        Ok(())
    }

    /// Put a key back to what it held before a failed commit.
    fn restore(&mut self, key: &StoreKey, previous: Option<&[u8]>) {
        let restored = match previous {
            Some(bytes) => self.store.set(key, bytes),
            None => self.store.remove(key),
        };
        if let Err(e) = restored {
            warn!(key = key.to_string(), error:% = e; "Failed to restore stored record");
        }
    }

    /// Read a diagram body, filling in missing component configs.
    pub fn load(&self, id: &str) -> Result<Diagram, PersistError> {
        let mut diagram: Diagram = self
            .read(&StoreKey::diagram(id))?
            .ok_or_else(|| PersistError::NotFound(id.to_string()))?;

        let filled = diagram.backfill_missing_config();
        if filled > 0 {
            warn!(diagram_id = id, components = filled; "Backfilled missing component config");
        }
        info!(diagram_id = id, version = diagram.version; "Loaded diagram");
        Ok(diagram)
    }

    pub fn version(&self, id: &str, version: u32) -> Result<DiagramVersion, PersistError> {
        self.read(&StoreKey::version(id, version))?
            .ok_or_else(|| PersistError::VersionNotFound {
                id: id.to_string(),
                version,
            })
    }

    /// Every stored snapshot from version 1 to the current one.
    pub fn versions(&self, id: &str) -> Result<Vec<DiagramVersion>, PersistError> {
        let index = self.list()?;
        let Some(entry) = index.iter().find(|m| m.id == id) else {
            return Err(PersistError::NotFound(id.to_string()));
        };

        let mut versions = Vec::new();
        for n in 1..=entry.current_version {
            if let Some(snapshot) = self.read(&StoreKey::version(id, n))? {
                versions.push(snapshot);
            }
        }
        Ok(versions)
    }

    /// Interchange document for a stored diagram.
    pub fn export(&self, id: &str) -> Result<String, PersistError> {
        let diagram = self.load(id)?;
        let json = interchange::export(&diagram).map_err(PersistError::Encode)?;
        info!(diagram_id = id; "Exported diagram");
        Ok(json)
    }

    /// Parse a document and store it as a new diagram at version 1.
    ///
    /// Nothing is written if the document is rejected.
    pub fn import(&mut self, json: &str) -> Result<Diagram, PersistError> {
        let diagram = interchange::import(json)?;
        let index = self.list()?;
        self.commit(index, &diagram, Some(IMPORTED))?;
        info!(diagram_id = diagram.id.as_str(), components = diagram.components.len(); "Imported diagram");
        Ok(diagram)
    }

    fn read<T: DeserializeOwned>(&self, key: &StoreKey) -> Result<Option<T>, PersistError> {
        let Some(bytes) = self.store.get(key)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| PersistError::Corrupt {
                key: key.to_string(),
                source,
            })
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, PersistError> {
    serde_json::to_vec(value).map_err(PersistError::Encode)
}
