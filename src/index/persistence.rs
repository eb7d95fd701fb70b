//! On-disk persistence of the variable index.
//!
//! The index serializes as a single JSON document under the workspace data
//! directory: a format version plus one encoded blob per (file, variable
//! name). Writes go through a temporary file and rename so a crashed save
//! never leaves a torn index behind.

use crate::error::{EngineError, EngineResult};
use crate::index::store::VariableIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Bumped whenever the encoded blob layout changes; mismatched snapshots
/// are discarded and rebuilt from source.
const FORMAT_VERSION: u32 = 1;

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    files: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug)]
pub struct IndexPersistence {
    base_path: PathBuf,
}

impl IndexPersistence {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn index_path(&self) -> PathBuf {
        self.base_path.join(INDEX_FILE)
    }

    pub fn exists(&self) -> bool {
        self.index_path().is_file()
    }

    /// Write the index snapshot, creating the data directory if needed.
    pub fn save(&self, index: &VariableIndex) -> EngineResult<()> {
        fs::create_dir_all(&self.base_path)?;
        let snapshot = Snapshot {
            version: FORMAT_VERSION,
            files: index.export_blobs(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        let path = self.index_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        info!(
            "saved index snapshot: {} files -> {}",
            snapshot.files.len(),
            path.display()
        );
        Ok(())
    }

    /// Load a previously saved snapshot. A missing file is `IndexNotFound`;
    /// a version mismatch is treated the same so callers rebuild.
    pub fn load(&self) -> EngineResult<VariableIndex> {
        let path = self.index_path();
        let json = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                EngineError::IndexNotFound { path: path.clone() }
            } else {
                EngineError::FileRead {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let snapshot: Snapshot = serde_json::from_str(&json)?;
        if snapshot.version != FORMAT_VERSION {
            debug!(
                "index snapshot version {} != {}, discarding",
                snapshot.version, FORMAT_VERSION
            );
            return Err(EngineError::IndexNotFound { path });
        }
        Ok(VariableIndex::import_blobs(&snapshot.files))
    }

    /// Remove the saved snapshot, if any.
    pub fn clear(&self) -> EngineResult<()> {
        let path = self.index_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
