//! Page navigation state
//!
//! Tracks the current page index over an ordered list of page keys.
//! Every entry point is defensive: UI rebuilds happen asynchronously
//! relative to navigation, so navigation must never fail on an empty or
//! stale key set.

use tracing::debug;

/// Sequencer over the deck's page keys. The index is 0-based internally
/// and 1-based in everything exposed to callers.
#[derive(Debug, Default)]
pub struct PageSequencer {
    keys: Vec<String>,
    index: usize,
}

impl PageSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the key list, keeping the caller's order. If the list
    /// shrank below the current index, clamp to the last valid page.
    /// Emits no navigation event.
    pub fn set_keys(&mut self, keys: Vec<String>) {
        self.keys = keys;
        if self.index >= self.keys.len() {
            self.index = self.keys.len().saturating_sub(1);
        }
    }

    pub fn page_count(&self) -> usize {
        self.keys.len()
    }

    /// Current 1-based page number, or 0 when there are no pages
    pub fn current_page_number(&self) -> u32 {
        if self.keys.is_empty() {
            0
        } else {
            self.index as u32 + 1
        }
    }

    /// Key of the currently active page
    pub fn current_key(&self) -> Option<&str> {
        self.keys.get(self.index).map(String::as_str)
    }

    /// Page key at a 0-based position
    pub fn key_for_index(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    /// Display label: "<current>/<count>", or "0/0" when empty
    pub fn label(&self) -> String {
        format!("{}/{}", self.current_page_number(), self.page_count())
    }

    /// Advance with wraparound. Returns the new 1-based page number, or
    /// `None` when there are no pages.
    pub fn next(&mut self) -> Option<u32> {
        if self.keys.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.keys.len();
        let page = self.current_page_number();
        debug!(page = page, "Switched to next page");
        Some(page)
    }

    /// Retreat with wraparound. Returns the new 1-based page number, or
    /// `None` when there are no pages.
    pub fn previous(&mut self) -> Option<u32> {
        if self.keys.is_empty() {
            return None;
        }
        self.index = (self.index + self.keys.len() - 1) % self.keys.len();
        let page = self.current_page_number();
        debug!(page = page, "Switched to previous page");
        Some(page)
    }

    /// Jump to a 1-based page number. Out-of-range requests are a no-op.
    /// In-range requests report the page even when the index did not
    /// change: callers rely on the event for forced refreshes.
    pub fn go_to_page(&mut self, page_number: u32) -> Option<u32> {
        let index = (page_number as usize).checked_sub(1)?;
        if index >= self.keys.len() {
            return None;
        }
        self.index = index;
        debug!(page = page_number, "Jumped to page");
        Some(self.current_page_number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequencer_with(count: usize) -> PageSequencer {
        let mut seq = PageSequencer::new();
        seq.set_keys((1..=count).map(|i| format!("page_{i}")).collect());
        seq
    }

    #[test]
    fn wraparound_both_directions() {
        let mut seq = sequencer_with(3);
        assert_eq!(seq.current_page_number(), 1);

        // At page 1, previous wraps to page 3
        assert_eq!(seq.previous(), Some(3));
        // At page 3, next wraps back to page 1
        assert_eq!(seq.next(), Some(1));
    }

    #[test]
    fn empty_sequencer_is_safe() {
        let mut seq = PageSequencer::new();
        assert_eq!(seq.next(), None);
        assert_eq!(seq.previous(), None);
        assert_eq!(seq.go_to_page(1), None);
        assert_eq!(seq.current_page_number(), 0);
        assert_eq!(seq.label(), "0/0");
        assert_eq!(seq.current_key(), None);
    }

    #[test]
    fn go_to_page_reports_even_without_index_change() {
        let mut seq = sequencer_with(3);
        assert_eq!(seq.go_to_page(2), Some(2));
        // Forced refresh: same page still reports
        assert_eq!(seq.go_to_page(2), Some(2));
        // Out of range is a no-op
        assert_eq!(seq.go_to_page(4), None);
        assert_eq!(seq.go_to_page(0), None);
        assert_eq!(seq.current_page_number(), 2);
    }

    #[test]
    fn set_keys_clamps_shrunken_list() {
        let mut seq = sequencer_with(5);
        seq.go_to_page(5);
        seq.set_keys(vec!["page_1".to_string(), "page_2".to_string()]);
        assert_eq!(seq.current_page_number(), 2);
        assert_eq!(seq.current_key(), Some("page_2"));

        seq.set_keys(Vec::new());
        assert_eq!(seq.current_page_number(), 0);
    }

    #[test]
    fn label_and_key_lookup() {
        let mut seq = sequencer_with(3);
        seq.next();
        assert_eq!(seq.label(), "2/3");
        assert_eq!(seq.key_for_index(0), Some("page_1"));
        assert_eq!(seq.key_for_index(2), Some("page_3"));
        assert_eq!(seq.key_for_index(3), None);
        assert_eq!(seq.current_key(), Some("page_2"));
    }
}
