use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::storage::atomic_write;
use crate::ops::sort::SortMode;

pub const STATE_FILE: &str = ".state.json";

/// Persisted TUI session state
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UiState {
    #[serde(default)]
    pub sort_mode: SortMode,
    /// Which grid has focus ("inventory" or "chest")
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub inventory_cursor: usize,
    #[serde(default)]
    pub chest_cursor: usize,
}

/// Read the session state. Missing or unreadable state is not an error.
pub fn read_ui_state(data_dir: &Path) -> Option<UiState> {
    let content = fs::read_to_string(data_dir.join(STATE_FILE)).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn write_ui_state(data_dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(&data_dir.join(STATE_FILE), content.as_bytes())
}
