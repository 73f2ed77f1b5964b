use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::task::Task;

const TASKS_FILE: &str = "tasks.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Reads and writes the whole collection as one JSON file.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tudu")
            .join(TASKS_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored collection. A missing file, an unreadable file, or
    /// content that no longer parses all yield an empty list; the bad cases
    /// are logged, never propagated.
    pub fn load(&self) -> Vec<Task> {
        if !self.path.exists() {
            return Vec::new();
        }
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "could not read tasks, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&data) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "stored tasks are malformed, starting empty");
                Vec::new()
            }
        }
    }

    /// Writes the full collection over whatever was stored before.
    pub fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(tasks)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_tasks() -> Vec<Task> {
        let mut bread = Task::new("buy bread".to_string(), None);
        bread.completed = true;
        vec![
            bread,
            Task::new(
                "return library books".to_string(),
                NaiveDate::from_ymd_opt(2024, 1, 1),
            ),
        ]
    }

    #[test]
    fn round_trip_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join(TASKS_FILE));

        let tasks = sample_tasks();
        storage.save(&tasks).unwrap();
        assert_eq!(storage.load(), tasks);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join(TASKS_FILE));
        assert!(storage.load().is_empty());
    }

    #[test]
    fn malformed_content_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TASKS_FILE);
        fs::write(&path, "{ not json ]").unwrap();

        let storage = Storage::new(path);
        assert!(storage.load().is_empty());
    }

    #[test]
    fn save_replaces_the_previous_collection() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join(TASKS_FILE));

        storage.save(&sample_tasks()).unwrap();
        let shorter = vec![Task::new("only one left".to_string(), None)];
        storage.save(&shorter).unwrap();

        assert_eq!(storage.load(), shorter);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("nested").join("deep").join(TASKS_FILE));

        storage.save(&sample_tasks()).unwrap();
        assert_eq!(storage.load().len(), 2);
    }
}
