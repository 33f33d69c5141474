//! JSON world snapshots.
//!
//! A snapshot carries entity schemas, stored rows and regions in one file and
//! backs the in-memory registry, store and spatial collaborator:
//!
//! ```json
//! {
//!   "entities": [{ "name": "Town", "properties": [...] }],
//!   "records":  [{ "entityType": "Town", "id": 4, "fields": { "Name": "Springfield" } }],
//!   "regions":  [{ "id": "town_4", "minX": 0, "minZ": 0, "maxX": 100, "maxZ": 100 }]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::metadata::{EntitySchema, InMemoryMetadataRegistry};
use crate::store::{InMemoryEntityStore, StoredEntity};
use crate::validation::{InMemoryRegions, Region};

/// Error type for snapshot loading.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Record {entity_type} #{id} has no matching entity schema")]
    UnknownRecordType { entity_type: String, id: String },
}

/// Schemas, rows and regions of one world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub entities: Vec<EntitySchema>,
    #[serde(default)]
    pub records: Vec<StoredEntity>,
    #[serde(default)]
    pub regions: Vec<Region>,
}

/// The collaborators built from a snapshot.
pub struct SnapshotParts {
    pub registry: InMemoryMetadataRegistry,
    pub store: InMemoryEntityStore,
    pub regions: InMemoryRegions,
}

impl Snapshot {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            entities = snapshot.entities.len(),
            records = snapshot.records.len(),
            regions = snapshot.regions.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Parse a snapshot and check every record against the schemas.
    pub fn from_json(content: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        snapshot.check()?;
        Ok(snapshot)
    }

    fn check(&self) -> Result<(), SnapshotError> {
        for record in &self.records {
            if !self.entities.iter().any(|e| e.name == record.entity_type) {
                return Err(SnapshotError::UnknownRecordType {
                    entity_type: record.entity_type.clone(),
                    id: record.id.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn into_parts(self) -> SnapshotParts {
        SnapshotParts {
            registry: self.entities.into_iter().collect(),
            store: self.records.into_iter().collect(),
            regions: self.regions.into_iter().collect(),
        }
    }
}
