//! Named button preset registry
//!
//! A flat, ordered list of reusable button definitions persisted as a JSON
//! array. Names are the unique key (case-sensitive); re-saving under an
//! existing name overwrites in place, preserving the preset's position.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::types::Preset;

/// Rejected rename requests, surfaced to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameError {
    EmptyName,
    Unchanged,
    NameTaken(String),
}

impl fmt::Display for RenameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameError::EmptyName => write!(f, "preset name must not be blank"),
            RenameError::Unchanged => write!(f, "new name matches the current name"),
            RenameError::NameTaken(name) => write!(f, "a preset named '{name}' already exists"),
        }
    }
}

impl std::error::Error for RenameError {}

/// File-backed registry of named presets.
pub struct PresetRegistry {
    path: PathBuf,
}

impl PresetRegistry {
    pub fn new(config_dir: &std::path::Path) -> Self {
        Self {
            path: config_dir.join(crate::constants::config::PRESET_FILE),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// All presets in stored order. An absent, empty or corrupt file is
    /// treated as an empty registry, never as an error.
    pub fn list(&self) -> Vec<Preset> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return Vec::new(),
        };
        if contents.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str(&contents) {
            Ok(presets) => presets,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to parse preset file, treating as empty");
                Vec::new()
            }
        }
    }

    /// Insert a preset, or overwrite the existing entry with the same name
    /// in place.
    pub fn add_or_replace(&self, preset: Preset) {
        let mut presets = self.list();
        match presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => presets.push(preset),
        }
        self.save(&presets);
    }

    /// Rename a preset. A missing `old_name` is a no-op; blank, unchanged
    /// or already-taken names are rejected without touching the store.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<(), RenameError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(RenameError::EmptyName);
        }
        if new_name == old_name {
            return Err(RenameError::Unchanged);
        }
        let mut presets = self.list();
        if presets.iter().any(|p| p.name == new_name) {
            return Err(RenameError::NameTaken(new_name.to_string()));
        }
        if let Some(preset) = presets.iter_mut().find(|p| p.name == old_name) {
            preset.name = new_name.to_string();
            self.save(&presets);
        }
        Ok(())
    }

    /// Remove all presets with the given name (expected to be at most one)
    pub fn delete(&self, name: &str) {
        let mut presets = self.list();
        let before = presets.len();
        presets.retain(|p| p.name != name);
        if presets.len() != before {
            self.save(&presets);
        }
    }

    /// Overwrite the preset file. Failures are logged; callers keep the
    /// in-memory list they were working with.
    pub fn save(&self, presets: &[Preset]) {
        if let Err(e) = self.try_save(presets) {
            error!(path = %self.path.display(), error = %e, "Failed to save preset file");
        }
    }

    fn try_save(&self, presets: &[Preset]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {parent:?}"))?;
        }
        let json = serde_json::to_string_pretty(presets).context("Failed to serialize presets")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write presets to {:?}", self.path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, ButtonDef};

    fn test_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("deckpad-preset-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn preset(name: &str, sign: &str) -> Preset {
        Preset {
            name: name.to_string(),
            button: ButtonDef {
                sign: sign.to_string(),
                action: Action::Shortcut("ctrl+c".to_string()),
                ..ButtonDef::default()
            },
        }
    }

    #[test]
    fn list_is_empty_for_absent_or_corrupt_file() {
        let dir = test_dir("empty");
        let registry = PresetRegistry::new(&dir);
        assert!(registry.list().is_empty());

        fs::write(registry.path(), "[{broken").unwrap();
        assert!(registry.list().is_empty());

        fs::write(registry.path(), "").unwrap();
        assert!(registry.list().is_empty());
    }

    #[test]
    fn add_or_replace_overwrites_by_name_preserving_position() {
        let dir = test_dir("overwrite");
        let registry = PresetRegistry::new(&dir);
        registry.add_or_replace(preset("first", "1"));
        registry.add_or_replace(preset("second", "2"));
        registry.add_or_replace(preset("first", "updated"));

        let presets = registry.list();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].name, "first");
        assert_eq!(presets[0].button.sign, "updated");
        assert_eq!(presets[1].name, "second");
    }

    #[test]
    fn rename_rejects_blank_unchanged_and_taken_names() {
        let dir = test_dir("rename");
        let registry = PresetRegistry::new(&dir);
        registry.add_or_replace(preset("alpha", "a"));
        registry.add_or_replace(preset("beta", "b"));

        assert_eq!(registry.rename("alpha", "  "), Err(RenameError::EmptyName));
        assert_eq!(registry.rename("alpha", "alpha"), Err(RenameError::Unchanged));
        assert_eq!(
            registry.rename("alpha", "beta"),
            Err(RenameError::NameTaken("beta".to_string()))
        );
        // Nothing was applied
        let names: Vec<_> = registry.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn rename_applies_and_missing_old_name_is_noop() {
        let dir = test_dir("rename-ok");
        let registry = PresetRegistry::new(&dir);
        registry.add_or_replace(preset("alpha", "a"));

        registry.rename("alpha", "gamma").unwrap();
        assert_eq!(registry.list()[0].name, "gamma");

        registry.rename("missing", "delta").unwrap();
        let names: Vec<_> = registry.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["gamma"]);
    }

    #[test]
    fn delete_removes_matching_entries() {
        let dir = test_dir("delete");
        let registry = PresetRegistry::new(&dir);
        registry.add_or_replace(preset("keep", "k"));
        registry.add_or_replace(preset("drop", "d"));

        registry.delete("drop");
        let names: Vec<_> = registry.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["keep"]);

        // Unknown name is a no-op
        registry.delete("drop");
        assert_eq!(registry.list().len(), 1);
    }
}
