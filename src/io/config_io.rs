use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::storage::atomic_write;
use crate::model::config::AppConfig;
use crate::model::task::Priority;
use crate::ops::sort::SortMode;

pub const CONFIG_FILE: &str = "config.toml";

/// Keys accepted by `config get` / `config set`, besides `ui.colors.<slot>`
pub const CONFIG_KEYS: &[&str] = &[
    "tasks.default_priority",
    "tasks.default_sort",
    "ui.frame_ms",
    "ui.show_key_hints",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse config.toml: {0}")]
    DocumentError(#[from] toml_edit::TomlError),
    #[error("unknown config key '{0}'")]
    UnknownKey(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing. A missing file yields
/// defaults and an empty document.
pub fn read_config(data_dir: &Path) -> Result<(AppConfig, toml_edit::DocumentMut), ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    let config: AppConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Just the parsed config
pub fn load_config(data_dir: &Path) -> Result<AppConfig, ConfigError> {
    read_config(data_dir).map(|(config, _)| config)
}

/// Write the document back to disk, preserving formatting
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    fs::create_dir_all(data_dir).map_err(|e| ConfigError::WriteError {
        path: path.clone(),
        source: e,
    })?;
    atomic_write(&path, doc.to_string().as_bytes())
        .map_err(|e| ConfigError::WriteError { path, source: e })
}

/// Current value of `key`, formatted for display
pub fn get_value(config: &AppConfig, key: &str) -> Result<String, ConfigError> {
    if let Some(slot) = key.strip_prefix("ui.colors.") {
        return config
            .ui
            .colors
            .get(slot)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()));
    }
    match key {
        "tasks.default_priority" => Ok(config.tasks.default_priority.to_string()),
        "tasks.default_sort" => Ok(config.tasks.default_sort.to_string()),
        "ui.frame_ms" => Ok(config.ui.frame_ms.to_string()),
        "ui.show_key_hints" => Ok(config.ui.show_key_hints.to_string()),
        _ => Err(ConfigError::UnknownKey(key.to_string())),
    }
}

/// Validate `value` for `key` and store it in the document
pub fn set_value(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    };

    if let Some(slot) = key.strip_prefix("ui.colors.") {
        if slot.is_empty() || slot.contains('.') {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }
        if !is_hex_color(value) {
            return Err(invalid("expected a colour like #1a2b3c"));
        }
        ensure_table(doc, "ui");
        if !doc["ui"].get("colors").is_some_and(|item| item.is_table()) {
            doc["ui"]["colors"] = toml_edit::Item::Table(toml_edit::Table::new());
        }
        doc["ui"]["colors"][slot] = toml_edit::value(value);
        return Ok(());
    }

    let item = match key {
        "tasks.default_priority" => {
            let n: u8 = value.trim().parse().map_err(|_| invalid("expected a number from 1 to 5"))?;
            Priority::new(n).ok_or_else(|| invalid("expected a number from 1 to 5"))?;
            toml_edit::value(n as i64)
        }
        "tasks.default_sort" => {
            let mode: SortMode = value.parse().map_err(|e: String| invalid(&e))?;
            toml_edit::value(mode.as_str())
        }
        "ui.frame_ms" => {
            let ms: u64 = value.trim().parse().map_err(|_| invalid("expected milliseconds"))?;
            if !(1..=1000).contains(&ms) {
                return Err(invalid("expected 1 to 1000 milliseconds"));
            }
            toml_edit::value(ms as i64)
        }
        "ui.show_key_hints" => {
            let b: bool = value.trim().parse().map_err(|_| invalid("expected true or false"))?;
            toml_edit::value(b)
        }
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    };

    let (section, field) = key
        .split_once('.')
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    ensure_table(doc, section);
    doc[section][field] = item;
    Ok(())
}

fn ensure_table(doc: &mut toml_edit::DocumentMut, name: &str) {
    if !doc.get(name).is_some_and(|item| item.is_table()) {
        doc[name] = toml_edit::Item::Table(toml_edit::Table::new());
    }
}

fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
