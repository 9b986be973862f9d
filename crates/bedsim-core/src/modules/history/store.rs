use super::{HistoryError, SavedEntry};
use crate::modules::serialization::{to_json_artifact, write_text_artifact};
use crate::modules::traits::HistoryStore;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryHistory {
    entries: Vec<SavedEntry>,
}

impl MemoryHistory {
    pub fn new(entries: Vec<SavedEntry>) -> Self {
        Self { entries }
    }

    pub fn into_entries(self) -> Vec<SavedEntry> {
        self.entries
    }
}

impl HistoryStore for MemoryHistory {
    fn entries(&self) -> &[SavedEntry] {
        &self.entries
    }

    fn append(&mut self, entry: SavedEntry) -> Result<(), HistoryError> {
        self.entries.push(entry);
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<SavedEntry, HistoryError> {
        remove_entry(&mut self.entries, index)
    }
}

/// History kept as a JSON array on disk. Every change rewrites the file.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonFileHistory {
    path: PathBuf,
    entries: Vec<SavedEntry>,
}

impl JsonFileHistory {
    /// Load the history at `path`. A file that does not exist yet is an
    /// empty history.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(source) if source.trim().is_empty() => Vec::new(),
            Ok(source) => serde_json::from_str(&source).map_err(|source| HistoryError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(error) if error.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(HistoryError::Read { path, source }),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "opened history");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), HistoryError> {
        let json = to_json_artifact(&self.entries).map_err(|source| HistoryError::Encode { source })?;
        write_text_artifact(&self.path, &json).map_err(|source| HistoryError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl HistoryStore for JsonFileHistory {
    fn entries(&self) -> &[SavedEntry] {
        &self.entries
    }

    fn append(&mut self, entry: SavedEntry) -> Result<(), HistoryError> {
        self.entries.push(entry);
        if let Err(error) = self.persist() {
            self.entries.pop();
            return Err(error);
        }
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<SavedEntry, HistoryError> {
        let removed = remove_entry(&mut self.entries, index)?;
        if let Err(error) = self.persist() {
            self.entries.insert(index, removed);
            return Err(error);
        }
        Ok(removed)
    }
}

fn remove_entry(entries: &mut Vec<SavedEntry>, index: usize) -> Result<SavedEntry, HistoryError> {
    if index >= entries.len() {
        return Err(HistoryError::IndexOutOfRange {
            index,
            len: entries.len(),
        });
    }
    Ok(entries.remove(index))
}
