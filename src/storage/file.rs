//! Graph file persistence
//!
//! The byte layout is whatever `bincode` produces for [`GraphFile`]; it is versioned but
//! not meant to be read by anything other than this crate.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::GraphStorage;
use crate::error::StorageError;

/// Bumped whenever the serialized shape of [`GraphStorage`] changes
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphFile {
    pub version: u32,
    pub storage: GraphStorage,
}

impl GraphStorage {
    /// Write the graph to `path`. Writes a sibling temp file first and renames it into place.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StorageError> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        let io_err = |source| StorageError::Io {
            path: tmp.clone(),
            source,
        };

        let file = File::create(&tmp).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        let graph_file = GraphFileRef {
            version: FORMAT_VERSION,
            storage: self,
        };
        bincode::serialize_into(&mut writer, &graph_file)?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        std::fs::rename(&tmp, path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let graph_file: GraphFile = bincode::deserialize_from(BufReader::new(file))?;

        if graph_file.version != FORMAT_VERSION {
            return Err(StorageError::Encode(Box::new(bincode::ErrorKind::Custom(
                format!(
                    "unsupported graph format version {} (expected {})",
                    graph_file.version, FORMAT_VERSION
                ),
            ))));
        }
        Ok(graph_file.storage)
    }
}

/// Borrowing twin of [`GraphFile`] so saving does not clone the store
#[derive(Serialize)]
struct GraphFileRef<'a> {
    version: u32,
    storage: &'a GraphStorage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EdgeFlags, Graph};

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");

        let mut g = GraphStorage::new();
        let a = g.add_node(43.73, 7.42, None);
        let b = g.add_node(43.74, 7.43, Some(50.0));
        g.add_edge(a, b, 1340.5, EdgeFlags::new(true, false, 50)).unwrap();
        g.save(&path).unwrap();

        let loaded = GraphStorage::load(&path).unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.edge_count(), 1);
        assert_eq!(loaded.elevation(b), Some(50.0));
        assert_eq!(loaded.bounds(), g.bounds());

        let cursor = loaded.edges(b).next().unwrap();
        assert_eq!(cursor.distance, 1340.5);
        assert!(cursor.flags.backward());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_load_missing_file() {
        let err = GraphStorage::load("/nonexistent/graph.bin").unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
