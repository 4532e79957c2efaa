//! CBOR snapshots of an [`InMemoryStore`].

use crate::error::{StoreError, StoreResult};
use crate::memory::{InMemoryStore, Tables};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

impl InMemoryStore {
    /// Encodes all tables as CBOR.
    pub fn write_snapshot<W: Write>(&self, writer: W) -> StoreResult<()> {
        ciborium::into_writer(&self.tables(), writer).map_err(StoreError::snapshot)
    }

    /// Decodes a store from CBOR produced by [`InMemoryStore::write_snapshot`].
    pub fn read_snapshot<R: Read>(reader: R) -> StoreResult<Self> {
        let tables: Tables = ciborium::from_reader(reader).map_err(StoreError::snapshot)?;
        Ok(Self::with_tables(tables))
    }

    /// Saves a snapshot file, replacing any existing file.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_snapshot(&mut writer)?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Loads a snapshot file; a missing file yields an empty store.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no snapshot, starting empty");
            return Ok(Self::new());
        }
        Self::read_snapshot(BufReader::new(File::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{IdAllocator, ModuleStore, PageStore};
    use crate::types::{Module, ModuleField, Page, PageBlock};
    use serde_json::json;
    use tempfile::TempDir;

    fn populated() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create_module(&Module {
                id: 3,
                namespace_id: 1,
                handle: "contacts".into(),
                fields: vec![ModuleField {
                    id: 4,
                    name: "email".into(),
                    ..Default::default()
                }],
                ..Default::default()
            })
            .unwrap();

        let mut block = PageBlock {
            kind: "RecordList".into(),
            ..Default::default()
        };
        block.options.insert("moduleID".into(), json!("3"));
        store
            .create_page(&Page {
                id: 5,
                namespace_id: 1,
                handle: "home".into(),
                blocks: vec![block],
                ..Default::default()
            })
            .unwrap();
        store
    }

    #[test]
    fn snapshot_survives_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.cbor");

        let store = populated();
        store.save(&path).unwrap();

        let loaded = InMemoryStore::load(&path).unwrap();
        assert_eq!(loaded.tables(), store.tables());

        // Loaded stores keep allocating above existing rows
        assert_eq!(loaded.next_id(), 6);
    }

    #[test]
    fn missing_snapshot_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = InMemoryStore::load(&dir.path().join("absent.cbor")).unwrap();
        assert_eq!(store.tables(), Tables::default());
    }

    #[test]
    fn garbage_snapshot_fails() {
        let err = InMemoryStore::read_snapshot(&b"\xff\x00not cbor"[..]).unwrap_err();
        assert!(matches!(err, StoreError::Snapshot(_)));
    }
}
