use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ops::sort::SortMode;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Priority preselected in the add form and used by `add` without `-p`
    #[serde(default = "default_priority")]
    pub default_priority: u8,
    /// Sort mode the TUI starts with when no session state exists
    #[serde(default)]
    pub default_sort: SortMode,
}

impl Default for TasksConfig {
    fn default() -> Self {
        TasksConfig {
            default_priority: default_priority(),
            default_sort: SortMode::None,
        }
    }
}

fn default_priority() -> u8 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Event loop tick in milliseconds. Animations advance once per tick.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    /// Hex colour overrides keyed by theme slot (e.g. `background = "#101010"`)
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            frame_ms: default_frame_ms(),
            show_key_hints: true,
            colors: HashMap::new(),
        }
    }
}

fn default_frame_ms() -> u64 {
    16
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.tasks.default_priority, 3);
        assert_eq!(config.tasks.default_sort, SortMode::None);
        assert_eq!(config.ui.frame_ms, 16);
        assert!(config.ui.show_key_hints);
        assert!(config.ui.colors.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r##"
[tasks]
default_sort = "deadline"

[ui.colors]
background = "#000000"
"##,
        )
        .unwrap();
        assert_eq!(config.tasks.default_sort, SortMode::Deadline);
        assert_eq!(config.tasks.default_priority, 3);
        assert_eq!(config.ui.frame_ms, 16);
        assert_eq!(config.ui.colors.get("background").map(String::as_str), Some("#000000"));
    }
}
