use super::traits::{LoadError, QueryLoader};
use crate::core::models::ids::LoopId;
use crate::core::models::query::{LoopCategory, LoopSequence, Query};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QueryFile {
    id: Option<String>,
    #[serde(default)]
    loops: Vec<LoopEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoopEntry {
    id: LoopId,
    category: String,
    #[serde(default)]
    sequences: Vec<SequenceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SequenceEntry {
    id: String,
    sequence: String,
}

/// Loads queries from `<dir>/<query_id>.toml`.
///
/// ```toml
/// id = "Q1"
///
/// [[loops]]
/// id = 1
/// category = "IL"
///
/// [[loops.sequences]]
/// id = "seq1"
/// sequence = "CGAC*GAAG"
/// ```
#[derive(Debug, Clone)]
pub struct TomlQueryLoader {
    dir: PathBuf,
}

impl TomlQueryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, query_id: &str) -> PathBuf {
        self.dir.join(format!("{query_id}.toml"))
    }

    fn read_query(path: &Path, query_id: &str) -> Result<Query, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: QueryFile = toml::from_str(&content).map_err(|e| LoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        if let Some(declared) = &file.id {
            if declared != query_id {
                return Err(LoadError::Invalid {
                    query_id: query_id.to_string(),
                    message: format!("file declares id '{declared}'"),
                });
            }
        }

        let mut query = Query::new(query_id);
        for entry in file.loops {
            let category: LoopCategory =
                entry.category.parse().map_err(|e| LoadError::Invalid {
                    query_id: query_id.to_string(),
                    message: format!("loop {}: {}", entry.id, e),
                })?;
            let sequences = entry
                .sequences
                .into_iter()
                .map(|s| LoopSequence::new(s.id, s.sequence))
                .collect();
            query.add_loop(entry.id, category, sequences)?;
        }
        Ok(query)
    }
}

impl QueryLoader for TomlQueryLoader {
    fn load(&self, query_id: &str) -> Result<Query, LoadError> {
        let path = self.path_for(query_id);
        debug!("Loading query '{}' from {:?}", query_id, path);
        let query = Self::read_query(&path, query_id)?;
        debug!("Query '{}' has {} loop(s).", query_id, query.len());
        Ok(query)
    }
}
