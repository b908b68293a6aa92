//! Button/page configuration store
//!
//! Owns the keyed page mapping persisted in `config.json`, including the
//! one-time migration from the legacy list-based layout, self-healing
//! defaults and the page add/delete/renumber operations. Non-page top-level
//! keys (audio settings, hardware monitor selection) ride along untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::constants::deck::{BUTTONS_PER_PAGE, BUTTON_PREFIX, MAX_PAGES, PAGE_PREFIX};
use crate::types::ButtonDef;

/// One page of button slots (1..=12). Slots without a stored definition
/// are simply absent from the map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub buttons: BTreeMap<u32, ButtonDef>,
}

/// In-memory form of the whole deck configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeckConfig {
    /// Page index (1-based) -> page contents
    pub pages: BTreeMap<u32, Page>,
    /// Non-page top-level entries, preserved verbatim across load/save
    pub extra: Map<String, Value>,
}

/// Rejected page/button operations, surfaced to the user as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    /// Deleting the only remaining page is forbidden
    LastPage,
    /// The page cap has been reached
    PageLimit,
    /// No page with the given index exists
    NoSuchPage,
    /// Button slot outside 1..=12
    NoSuchSlot,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::LastPage => write!(f, "cannot delete the last remaining page"),
            PageError::PageLimit => write!(f, "page limit of {MAX_PAGES} reached"),
            PageError::NoSuchPage => write!(f, "no such page"),
            PageError::NoSuchSlot => {
                write!(f, "button slot must be between 1 and {BUTTONS_PER_PAGE}")
            }
        }
    }
}

impl std::error::Error for PageError {}

/// Build the stable string key for a page index
pub fn page_key(index: u32) -> String {
    format!("{PAGE_PREFIX}{index}")
}

/// Build the stable string key for a button slot
pub fn button_key(slot: u32) -> String {
    format!("{BUTTON_PREFIX}{slot}")
}

fn parse_page_key(key: &str) -> Option<u32> {
    key.strip_prefix(PAGE_PREFIX)?.parse().ok()
}

fn parse_button_key(key: &str) -> Option<u32> {
    key.strip_prefix(BUTTON_PREFIX)?.parse().ok()
}

impl DeckConfig {
    /// The synthesized first-run configuration: one empty page
    pub fn default_deck() -> Self {
        let mut pages = BTreeMap::new();
        pages.insert(1, Page::default());
        Self {
            pages,
            extra: Map::new(),
        }
    }

    /// Ordered page keys ("page_1", "page_2", ...) for the sequencer
    pub fn page_keys(&self) -> Vec<String> {
        self.pages.keys().map(|&i| page_key(i)).collect()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: u32) -> Option<&Page> {
        self.pages.get(&index)
    }

    /// Look up a page by its string key
    pub fn page_by_key(&self, key: &str) -> Option<&Page> {
        self.pages.get(&parse_page_key(key)?)
    }

    /// Stored definition for a button slot on a page
    pub fn button(&self, page_key: &str, slot: u32) -> Option<&ButtonDef> {
        self.page_by_key(page_key)?.buttons.get(&slot)
    }

    /// Add a new empty page after the highest existing index.
    /// Returns the new page's index.
    pub fn add_page(&mut self) -> Result<u32, PageError> {
        if self.pages.len() >= MAX_PAGES {
            return Err(PageError::PageLimit);
        }
        let next = self.pages.keys().next_back().map_or(1, |&last| last + 1);
        self.pages.insert(next, Page::default());
        Ok(next)
    }

    /// Delete a page and renumber the following pages so keys stay
    /// contiguous starting at 1.
    pub fn delete_page(&mut self, index: u32) -> Result<(), PageError> {
        if !self.pages.contains_key(&index) {
            return Err(PageError::NoSuchPage);
        }
        if self.pages.len() <= 1 {
            return Err(PageError::LastPage);
        }
        self.pages.remove(&index);
        let remaining = std::mem::take(&mut self.pages);
        for (new_index, (_, page)) in (1u32..).zip(remaining) {
            self.pages.insert(new_index, page);
        }
        Ok(())
    }

    /// Store a button definition in a slot
    pub fn set_button(&mut self, index: u32, slot: u32, def: ButtonDef) -> Result<(), PageError> {
        if slot < 1 || slot > BUTTONS_PER_PAGE {
            return Err(PageError::NoSuchSlot);
        }
        let page = self.pages.get_mut(&index).ok_or(PageError::NoSuchPage)?;
        page.buttons.insert(slot, def);
        Ok(())
    }

    /// Reset a slot to the empty definition (default font, no action)
    pub fn clear_button(&mut self, index: u32, slot: u32) -> Result<(), PageError> {
        self.set_button(index, slot, ButtonDef::cleared())
    }
}

/// File-backed store for the deck configuration.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store rooted at the given config directory
    pub fn new(config_dir: &std::path::Path) -> Self {
        Self {
            path: config_dir.join(crate::constants::config::DECK_FILE),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Read the persisted configuration.
    ///
    /// Absent or malformed files yield the default single-page deck, which
    /// is immediately written back. A legacy `{"pages": [...]}` layout is
    /// migrated to keyed pages and rewritten once.
    pub fn load(&self) -> DeckConfig {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => {
                info!(path = %self.path.display(), "No deck config found, creating default");
                let config = DeckConfig::default_deck();
                self.save(&config);
                return config;
            }
        };

        let mut root = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                error!(path = %self.path.display(), "Deck config is not a JSON object, using default");
                let config = DeckConfig::default_deck();
                self.save(&config);
                return config;
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to parse deck config, using default");
                let config = DeckConfig::default_deck();
                self.save(&config);
                return config;
            }
        };

        // One-time migration from the legacy list-based layout
        let mut dirty = false;
        if let Some(Value::Array(legacy_pages)) = root.remove("pages") {
            info!(
                count = legacy_pages.len(),
                "Legacy page list detected, migrating to keyed pages"
            );
            for (i, page_body) in legacy_pages.into_iter().enumerate() {
                root.insert(page_key(i as u32 + 1), page_body);
            }
            dirty = true;
        }

        let mut config = Self::from_value(root);

        // Guarantee at least one page after migration or a stripped file
        if config.pages.is_empty() {
            warn!("Deck config holds no pages, synthesizing page_1");
            config.pages.insert(1, Page::default());
            dirty = true;
        }

        if dirty {
            self.save(&config);
        }
        config
    }

    fn from_value(root: Map<String, Value>) -> DeckConfig {
        let mut config = DeckConfig::default();
        for (key, value) in root {
            let Some(index) = parse_page_key(&key) else {
                config.extra.insert(key, value);
                continue;
            };
            let Value::Object(body) = value else {
                warn!(page = %key, "Page body is not an object, treating as empty");
                config.pages.insert(index, Page::default());
                continue;
            };
            let mut page = Page::default();
            for (button_name, button_value) in body {
                let Some(slot) = parse_button_key(&button_name) else {
                    warn!(page = %key, entry = %button_name, "Unrecognized page entry, skipping");
                    continue;
                };
                if slot < 1 || slot > BUTTONS_PER_PAGE {
                    warn!(page = %key, slot = slot, "Button slot out of range, skipping");
                    continue;
                }
                match serde_json::from_value::<ButtonDef>(button_value) {
                    Ok(def) => {
                        page.buttons.insert(slot, def);
                    }
                    Err(e) => {
                        warn!(page = %key, slot = slot, error = %e, "Malformed button entry, skipping");
                    }
                }
            }
            config.pages.insert(index, page);
        }
        config
    }

    fn to_value(config: &DeckConfig) -> Map<String, Value> {
        let mut root = Map::new();
        for (&index, page) in &config.pages {
            let mut body = Map::new();
            for (&slot, def) in &page.buttons {
                // Wire types serialize infallibly
                body.insert(
                    button_key(slot),
                    serde_json::to_value(def).unwrap_or(Value::Null),
                );
            }
            root.insert(page_key(index), Value::Object(body));
        }
        for (key, value) in &config.extra {
            root.insert(key.clone(), value.clone());
        }
        root
    }

    /// Serialize the full mapping. I/O failure is logged; the in-memory
    /// state stays the caller's responsibility.
    pub fn save(&self, config: &DeckConfig) {
        if let Err(e) = self.try_save(config) {
            error!(path = %self.path.display(), error = %e, "Failed to save deck config");
        }
    }

    fn try_save(&self, config: &DeckConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {parent:?}"))?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(Self::to_value(config)))
            .context("Failed to serialize deck config")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write deck config to {:?}", self.path))?;
        Ok(())
    }
}
