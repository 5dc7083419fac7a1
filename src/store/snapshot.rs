/// Durable form of a FileStore: every bound name with its bytes, as JSON.
/// Handles detached by unlink are not part of the namespace and are not saved.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use super::FileStore;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    name: String,
    content: Vec<u8>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    files: Vec<SnapshotFile>,
}

impl FileStore {
    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let snapshot = Snapshot {
            files: self
                .entries()
                .into_iter()
                .map(|file| SnapshotFile {
                    name: file.name().to_string(),
                    content: file.contents(),
                })
                .collect(),
        };
        let json = serde_json::to_string(&snapshot).context("Failed to serialize file store")?;
        fs::write(path, json).with_context(|| format!("Failed to write snapshot {:?}", path))?;
        info!("Saved {} file(s) to {:?}", snapshot.files.len(), path);
        Ok(())
    }

    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<FileStore> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {:?}", path))?;
        let snapshot: Snapshot = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse snapshot {:?}", path))?;

        let store = FileStore::new();
        for file in snapshot.files {
            store
                .insert(&file.name, file.content)
                .with_context(|| format!("Snapshot {:?} holds an unusable entry", path))?;
        }
        info!("Loaded {} file(s) from {:?}", store.len(), path);
        Ok(store)
    }
}
