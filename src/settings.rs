//! Small key-value preference file kept between sessions.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::log_debug;
use crate::solve::DisplayMode;

const DISPLAY_MODE_KEY: &str = "display_mode";

/// YAML mapping of string keys to string values. A missing file is an empty store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl SettingsStore {
    pub fn load(path: &Path) -> Result<Self> {
        let values = match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_yaml::from_str(&text)
                .with_context(|| format!("failed to parse settings {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read settings {}", path.display()))
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    /// Load, falling back to an empty store that still saves to `path`.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            log_debug(&format!("settings ignored: {err:#}"));
            Self {
                path: path.to_path_buf(),
                values: BTreeMap::new(),
            }
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns true when the stored value changed.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.get(key) == Some(value.as_str()) {
            return false;
        }
        self.values.insert(key.to_string(), value);
        true
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let yaml = serde_yaml::to_string(&self.values).context("failed to encode settings")?;
        let staging = self.path.with_extension("yaml.tmp");
        fs::write(&staging, yaml)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    pub fn display_mode(&self) -> Option<DisplayMode> {
        self.get(DISPLAY_MODE_KEY).and_then(DisplayMode::from_label)
    }

    /// Store and persist `mode` if it differs from what is on disk.
    pub fn remember_display_mode(&mut self, mode: DisplayMode) -> Result<()> {
        if self.set(DISPLAY_MODE_KEY, mode.label()) {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_settings(name: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        env::temp_dir()
            .join(format!("solvecam-settings-{name}-{stamp}"))
            .join("settings.yaml")
    }

    #[test]
    fn missing_file_is_empty_store() {
        let path = temp_settings("missing");
        let store = SettingsStore::load(&path).expect("load");
        assert_eq!(store.display_mode(), None);
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn display_mode_survives_reload() {
        let path = temp_settings("reload");
        let mut store = SettingsStore::load(&path).expect("load");
        store
            .remember_display_mode(DisplayMode::Solved)
            .expect("save");

        let reloaded = SettingsStore::load(&path).expect("reload");
        assert_eq!(reloaded.display_mode(), Some(DisplayMode::Solved));
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.contains("display_mode: solved"));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn unknown_keys_are_kept() {
        let path = temp_settings("keys");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "theme: dark\ndisplay_mode: live\n").unwrap();

        let mut store = SettingsStore::load(&path).expect("load");
        assert_eq!(store.display_mode(), Some(DisplayMode::Live));
        store
            .remember_display_mode(DisplayMode::Solved)
            .expect("save");

        let reloaded = SettingsStore::load(&path).expect("reload");
        assert_eq!(reloaded.get("theme"), Some("dark"));
        assert_eq!(reloaded.display_mode(), Some(DisplayMode::Solved));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let path = temp_settings("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "- not\n- a mapping\n").unwrap();

        assert!(SettingsStore::load(&path).is_err());
        let store = SettingsStore::load_or_default(&path);
        assert_eq!(store.display_mode(), None);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn set_reports_changes_only() {
        let mut store = SettingsStore::load(&temp_settings("set")).expect("load");
        assert!(store.set("display_mode", "live"));
        assert!(!store.set("display_mode", "live"));
    }
}
