//! Bar widget layout store
//!
//! Maps the five fixed bar slots to widget bindings. An absent or corrupt
//! file yields an empty layout which is immediately persisted as the
//! canonical empty state; individual bad entries are skipped with a
//! warning so the remaining slots still load.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{error, warn};

use crate::constants::bar::{SLOT_COUNT, SLOT_PREFIX};
use crate::types::WidgetBinding;

/// Slot id -> binding. BTreeMap keeps serialization deterministic.
pub type BarLayout = BTreeMap<String, WidgetBinding>;

/// True for one of the five fixed slot identifiers
pub fn is_valid_slot(slot_id: &str) -> bool {
    slot_id
        .strip_prefix(SLOT_PREFIX)
        .and_then(|n| n.parse::<u32>().ok())
        .is_some_and(|n| (1..=SLOT_COUNT).contains(&n))
}

/// File-backed store for the bar layout.
pub struct BarLayoutStore {
    path: PathBuf,
}

impl BarLayoutStore {
    pub fn new(config_dir: &std::path::Path) -> Self {
        Self {
            path: config_dir.join(crate::constants::config::BAR_FILE),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load the slot mapping, self-healing an absent/empty/corrupt file to
    /// the persisted empty layout.
    pub fn load(&self) -> BarLayout {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) if !contents.trim().is_empty() => contents,
            _ => {
                let layout = BarLayout::new();
                self.save(&layout);
                return layout;
            }
        };

        let root = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                error!(path = %self.path.display(), "Failed to parse bar layout, resetting to empty");
                let layout = BarLayout::new();
                self.save(&layout);
                return layout;
            }
        };

        let mut layout = BarLayout::new();
        for (slot_id, entry) in root {
            if !is_valid_slot(&slot_id) {
                warn!(slot = %slot_id, "Unknown bar slot identifier, skipping");
                continue;
            }
            match serde_json::from_value::<WidgetBinding>(entry) {
                Ok(binding) => {
                    layout.insert(slot_id, binding);
                }
                Err(e) => {
                    warn!(slot = %slot_id, error = %e, "Invalid bar layout entry, skipping");
                }
            }
        }
        layout
    }

    /// Straightforward overwrite serialization; failure is logged, not
    /// propagated.
    pub fn save(&self, layout: &BarLayout) {
        if let Err(e) = self.try_save(layout) {
            error!(path = %self.path.display(), error = %e, "Failed to save bar layout");
        }
    }

    fn try_save(&self, layout: &BarLayout) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {parent:?}"))?;
        }
        let json =
            serde_json::to_string_pretty(layout).context("Failed to serialize bar layout")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write bar layout to {:?}", self.path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("deckpad-bar-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn absent_file_self_heals_to_persisted_empty_layout() {
        let dir = test_dir("absent");
        let store = BarLayoutStore::new(&dir);
        let layout = store.load();
        assert!(layout.is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{}");
    }

    #[test]
    fn corrupt_file_resets_to_empty() {
        let dir = test_dir("corrupt");
        let store = BarLayoutStore::new(&dir);
        fs::write(store.path(), "[1, 2]").unwrap();
        assert!(store.load().is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{}");
    }

    #[test]
    fn loads_valid_slots_and_skips_bad_entries() {
        let dir = test_dir("mixed");
        let store = BarLayoutStore::new(&dir);
        fs::write(
            store.path(),
            r#"{
                "Bar_target_1": {"widget_type": "ClockWidget", "settings": {"position": [5, 9], "font_size": 20}},
                "Bar_target_9": {"widget_type": "ClockWidget", "settings": {"position": [0, 0]}},
                "Bar_target_2": "not an object"
            }"#,
        )
        .unwrap();

        let layout = store.load();
        assert_eq!(layout.len(), 1);
        let binding = &layout["Bar_target_1"];
        assert_eq!(binding.widget_type, "ClockWidget");
        assert_eq!(binding.settings.position, [5, 9]);
        assert_eq!(binding.settings.extra["font_size"], 20);
    }

    #[test]
    fn roundtrip_preserves_type_specific_settings() {
        let dir = test_dir("roundtrip");
        let store = BarLayoutStore::new(&dir);
        fs::write(
            store.path(),
            r#"{"Bar_target_3": {"widget_type": "TimerWidget", "settings": {"position": [12, 0], "duration_secs": 300}}}"#,
        )
        .unwrap();

        let layout = store.load();
        store.save(&layout);
        let reloaded = store.load();
        assert_eq!(layout, reloaded);
        assert_eq!(
            reloaded["Bar_target_3"].settings.extra["duration_secs"],
            300
        );
    }

    #[test]
    fn slot_validation() {
        assert!(is_valid_slot("Bar_target_1"));
        assert!(is_valid_slot("Bar_target_5"));
        assert!(!is_valid_slot("Bar_target_6"));
        assert!(!is_valid_slot("Bar_target_0"));
        assert!(!is_valid_slot("bar_target_1"));
        assert!(!is_valid_slot("somewhere_else"));
    }
}
