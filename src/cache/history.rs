//! Persisted recording history
//!
//! Keeps metadata for the last few recordings, newest first, in a single
//! JSON file under the project data directory. Loading never fails: a
//! missing or unparsable file yields an empty history.

use directories::ProjectDirs;
use jiff::Zoned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum entries retained; oldest are evicted first
pub const HISTORY_CAPACITY: usize = 5;

/// Metadata for one past recording
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub size: String,
    pub duration: String,
}

impl HistoryEntry {
    /// Build an entry for a just-captured clip
    pub fn new(byte_count: usize, duration: Duration) -> Self {
        Self {
            timestamp: Zoned::now().strftime("%Y-%m-%d %H:%M:%S").to_string(),
            size: format!("{:.2}KB", byte_count as f64 / 1024.0),
            duration: format!("{}s", duration.as_secs()),
        }
    }
}

pub struct RecordingHistory {
    path: Option<PathBuf>,
    entries: Vec<HistoryEntry>,
}

impl RecordingHistory {
    /// Load the history from the default data directory.
    ///
    /// Falls back to a memory-only history when the platform offers no data
    /// directory; storage problems are never fatal.
    pub fn load_default() -> Self {
        match default_history_path() {
            Some(path) => Self::load_from(path),
            None => {
                log::warn!("no data directory available; recording history will not persist");
                Self {
                    path: None,
                    entries: Vec::new(),
                }
            }
        }
    }

    /// Load from an explicit file path (absent or corrupt file = empty)
    pub fn load_from(path: PathBuf) -> Self {
        let mut entries: Vec<HistoryEntry> = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default();
        entries.truncate(HISTORY_CAPACITY);

        Self {
            path: Some(path),
            entries,
        }
    }

    /// Prepend an entry, evict past capacity, and persist synchronously
    pub fn record(&mut self, entry: HistoryEntry) -> std::io::Result<()> {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);
        self.persist()
    }

    fn persist(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }

    /// Entries, newest first
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn default_history_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "accent-detect", "accent-detect")?;
    Some(project_dirs.data_dir().join("history.json"))
}
