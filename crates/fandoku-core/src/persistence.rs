//! Save/Load for fetched pedigree data.
//!
//! Uses bincode for a compact binary snapshot of the store, the slot
//! bindings, and the loader watermark, so reopening a chart does not
//! re-fetch generations that were already resolved.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::index::AhnentafelIndex;
use crate::store::AncestorStore;

/// Version number for the snapshot format (increment when it changes).
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the pedigree state.
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Snapshot format version.
    pub version: u32,
    /// All fetched person records.
    pub store: AncestorStore,
    /// Slot bindings, pedigree collapse included.
    pub index: AhnentafelIndex,
    /// Highest generation the loader had requested.
    pub retrieved_through: u32,
}

/// Errors from snapshot I/O.
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Snapshot version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SaveError {}

/// Write a snapshot of the pedigree to a writer.
pub fn save_pedigree<W: Write>(
    writer: W,
    store: &AncestorStore,
    index: &AhnentafelIndex,
    retrieved_through: u32,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        store: store.clone(),
        index: index.clone(),
        retrieved_through,
    };
    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Pedigree state restored from a snapshot.
pub struct LoadedPedigree {
    pub store: AncestorStore,
    pub index: AhnentafelIndex,
    pub retrieved_through: u32,
}

/// Read a snapshot back from a reader.
pub fn load_pedigree<R: Read>(reader: R) -> Result<LoadedPedigree, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;
    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }
    Ok(LoadedPedigree {
        store: save_data.store,
        index: save_data.index,
        retrieved_through: save_data.retrieved_through,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::{Person, PersonName};

    fn snapshot_fixture() -> (AncestorStore, AhnentafelIndex) {
        let mut store = AncestorStore::new();
        store.add(
            Person::new("root", PersonName::new("Nils", "Aas"))
                .with_parents(Some("f"), Some("m")),
        );
        store.add(Person::new("f", PersonName::new("Olav", "Aas")));
        store.add(Person::new("m", PersonName::new("Ingrid", "Moe")));
        let mut index = AhnentafelIndex::new();
        index.assign_root("root".to_string());
        index.rebuild(&store);
        (store, index)
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (store, index) = snapshot_fixture();
        let mut buffer = Vec::new();
        save_pedigree(&mut buffer, &store, &index, 1).unwrap();

        let loaded = load_pedigree(buffer.as_slice()).unwrap();
        assert_eq!(loaded.retrieved_through, 1);
        assert_eq!(loaded.store.len(), 3);
        assert_eq!(loaded.index.person_at(2).map(String::as_str), Some("f"));
        assert_eq!(loaded.index.person_at(3).map(String::as_str), Some("m"));
    }

    #[test]
    fn test_version_mismatch_is_detected() {
        let (store, index) = snapshot_fixture();
        let bad = SaveData {
            version: SAVE_VERSION + 1,
            store,
            index,
            retrieved_through: 0,
        };
        let bytes = bincode::serialize(&bad).unwrap();
        match load_pedigree(bytes.as_slice()) {
            Err(SaveError::VersionMismatch { found, .. }) => {
                assert_eq!(found, SAVE_VERSION + 1);
            }
            other => panic!("expected version mismatch, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_truncated_snapshot_is_an_error() {
        let (store, index) = snapshot_fixture();
        let mut buffer = Vec::new();
        save_pedigree(&mut buffer, &store, &index, 1).unwrap();
        buffer.truncate(buffer.len() / 2);
        assert!(matches!(
            load_pedigree(buffer.as_slice()),
            Err(SaveError::Bincode(_))
        ));
    }
}
