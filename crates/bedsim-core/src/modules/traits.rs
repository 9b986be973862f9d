use crate::domain::EngineOutput;
use crate::modules::history::{HistoryError, SavedEntry, default_entry_name};
use chrono::{DateTime, Utc};

/// Append-only list of saved results, removable by index.
///
/// Indices refer to insertion order; `entries()[0]` is the oldest entry.
pub trait HistoryStore {
    fn entries(&self) -> &[SavedEntry];

    fn append(&mut self, entry: SavedEntry) -> Result<(), HistoryError>;

    fn remove(&mut self, index: usize) -> Result<SavedEntry, HistoryError>;
}

pub trait HistoryRecorder {
    /// Snapshot `output` under `name`, or under the next `Organ N` name when
    /// `name` is blank.
    fn record(
        &mut self,
        name: &str,
        output: &EngineOutput,
        created_at: DateTime<Utc>,
    ) -> Result<SavedEntry, HistoryError>;
}

impl<T> HistoryRecorder for T
where
    T: HistoryStore,
{
    fn record(
        &mut self,
        name: &str,
        output: &EngineOutput,
        created_at: DateTime<Utc>,
    ) -> Result<SavedEntry, HistoryError> {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            default_entry_name(self.entries().len())
        } else {
            trimmed.to_string()
        };

        let entry = SavedEntry::from_output(name, output, created_at);
        self.append(entry.clone())?;
        Ok(entry)
    }
}
