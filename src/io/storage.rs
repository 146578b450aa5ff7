use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::model::task::{CompletedTask, Priority, Task, TaskId};
use crate::ops::store::TaskStore;

pub const TASKS_FILE: &str = "tasks.json";
pub const COMPLETED_FILE: &str = "completed.json";

/// Error type for loading and saving the task files
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not determine a data directory; pass --data-dir or set CRAFTDO_DIR")]
    NoDataDir,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: io::Error,
    },
    #[error("could not serialize tasks: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Pick the data directory: an explicit path (flag or `CRAFTDO_DIR`, both
/// resolved by clap) wins, otherwise the platform data dir.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf, StorageError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    directories::ProjectDirs::from("", "", "craftdo")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}

/// Whether `dir` already holds task data
pub fn is_initialized(dir: &Path) -> bool {
    dir.join(TASKS_FILE).exists() || dir.join(COMPLETED_FILE).exists()
}

// ---------------------------------------------------------------------------
// On-disk records
// ---------------------------------------------------------------------------

/// Lenient view of a stored task. Files may be hand-edited, so a missing id
/// is regenerated and an out-of-range priority is clamped instead of
/// rejecting the whole file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    is_done: bool,
    #[serde(default = "default_priority")]
    priority: i64,
    #[serde(default)]
    deadline: Option<DateTime<Utc>>,
}

fn default_priority() -> i64 {
    Priority::default().value() as i64
}

impl TaskRecord {
    fn into_task(self) -> Task {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => TaskId::from(id),
            _ => {
                let id = TaskId::generate();
                warn!(%id, name = %self.name, "stored task had no id; assigned one");
                id
            }
        };
        if !(Priority::MIN as i64..=Priority::MAX as i64).contains(&self.priority) {
            warn!(%id, priority = self.priority, "clamped out-of-range priority");
        }
        Task {
            id,
            name: self.name,
            is_done: self.is_done,
            priority: Priority::clamped(self.priority),
            deadline: self.deadline,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletedRecord {
    #[serde(flatten)]
    task: TaskRecord,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

impl CompletedRecord {
    fn into_completed(self) -> CompletedTask {
        let task = self.task.into_task();
        let completed_at = self.completed_at.unwrap_or_else(|| {
            warn!(id = %task.id, "completed task had no completedAt; stamping now");
            Utc::now()
        });
        CompletedTask::from_task(task, completed_at)
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Read a JSON array file. A missing or blank file is an empty list.
fn read_records<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, StorageError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StorageError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text).map_err(|e| StorageError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load both collections from `dir`
pub fn load_store(dir: &Path) -> Result<TaskStore, StorageError> {
    let active: Vec<TaskRecord> = read_records(&dir.join(TASKS_FILE))?;
    let completed: Vec<CompletedRecord> = read_records(&dir.join(COMPLETED_FILE))?;
    debug!(
        dir = %dir.display(),
        active = active.len(),
        completed = completed.len(),
        "loaded task files"
    );
    Ok(TaskStore::from_parts(
        active.into_iter().map(TaskRecord::into_task).collect(),
        completed
            .into_iter()
            .map(CompletedRecord::into_completed)
            .collect(),
    ))
}

/// Write both collections to `dir`, each file replaced atomically
pub fn save_store(dir: &Path, store: &TaskStore) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::WriteError {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let active: Vec<&Task> = store.active().collect();
    let completed: Vec<&CompletedTask> = store.completed().collect();
    write_json(&dir.join(TASKS_FILE), &active)?;
    write_json(&dir.join(COMPLETED_FILE), &completed)?;
    debug!(
        dir = %dir.display(),
        active = active.len(),
        completed = completed.len(),
        "saved task files"
    );
    Ok(())
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    atomic_write(path, json.as_bytes()).map_err(|e| StorageError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write `content` to a temp file in the same directory, then rename over `path`
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
