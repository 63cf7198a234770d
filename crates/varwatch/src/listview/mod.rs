//! Paginated, searchable, sortable list navigation.
//!
//! [`ListView`] is a pure state machine over an ordered list of string keys.
//! It performs no I/O and knows nothing about rendering; every terminal
//! panel (variables, kernels) drives its own instance the same way.
//!
//! Invariants held after every operation:
//! - `position < keys.len()` when `keys` is non-empty, else `position == 0`
//! - `page == 1 + position / page_size`

use std::collections::HashMap;

use crate::kernel::KernelInfo;
use crate::Snapshot;


/// Navigation direction for [`ListView::navigate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Previous key, rolling onto the previous page at a page boundary.
    Up,
    /// Next key, rolling onto the next page at a page boundary.
    Down,
    /// First key of the previous page.
    Left,
    /// First key of the next page.
    Right,
}

/// Key ordering applied by [`ListView::apply_sort`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    /// Lexicographic by key.
    #[default]
    ByName,
    /// Grouped by tag, lexicographic by key within a group.
    ByType,
    /// Only keys whose name or tag contains the filter text, lexicographic.
    Filtered,
}

impl SortMode {
    /// Short label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            SortMode::ByName => "name",
            SortMode::ByType => "type",
            SortMode::Filtered => "filter",
        }
    }
}

/// Result of recomputing the key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOutcome {
    /// The requested mode is in effect.
    Applied,
    /// The filter matched nothing; the view fell back to [`SortMode::ByName`].
    FilterEmpty,
}

/// Anything a list view can be built from: a set of keys, each with a tag.
pub trait ListSource {
    /// All keys, in any order.
    fn list_keys(&self) -> Vec<String>;
    /// Tag used for grouping and filtering (a type tag for variables).
    fn tag_of(&self, key: &str) -> Option<&str>;

    /// Every key paired with its tag (empty when it has none).
    ///
    /// Sorting reads tags through this once per key. Sources whose
    /// `tag_of` is not a cheap lookup should override it.
    fn tagged_keys(&self) -> Vec<(String, String)> {
        self.list_keys()
            .into_iter()
            .map(|key| {
                let tag = self.tag_of(&key).unwrap_or_default().to_string();
                (key, tag)
            })
            .collect()
    }
}

impl ListSource for Snapshot {
    fn list_keys(&self) -> Vec<String> {
        self.names().map(str::to_string).collect()
    }

    fn tag_of(&self, key: &str) -> Option<&str> {
        self.get(key).map(|record| record.type_tag.as_str())
    }
}

impl ListSource for [KernelInfo] {
    fn list_keys(&self) -> Vec<String> {
        self.iter().map(|kernel| kernel.reference.clone()).collect()
    }

    fn tag_of(&self, key: &str) -> Option<&str> {
        self.iter()
            .find(|kernel| kernel.reference == key)
            .map(|kernel| kernel.kernel_name.as_str())
    }

    fn tagged_keys(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|kernel| (kernel.reference.clone(), kernel.kernel_name.clone()))
            .collect()
    }
}

impl ListSource for HashMap<String, String> {
    fn list_keys(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn tag_of(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Navigation state for one panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    keys: Vec<String>,
    position: usize,
    page_size: usize,
    page: usize,
    sort_mode: SortMode,
    filter_text: Option<String>,
    search_query: Option<String>,
    search_matches: Vec<usize>,
    search_cursor: usize,
}

impl ListView {
    /// Creates an empty view. A `page_size` of zero is treated as one.
    pub fn new(page_size: usize) -> Self {
        Self {
            keys: Vec::new(),
            position: 0,
            page_size: page_size.max(1),
            page: 1,
            sort_mode: SortMode::ByName,
            filter_text: None,
            search_query: None,
            search_matches: Vec::new(),
            search_cursor: 0,
        }
    }

    /// Current keys in display order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Index of the selected key.
    pub fn position(&self) -> usize {
        self.position
    }

    /// One-based page holding the selected key.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Keys per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages (at least one).
    pub fn page_count(&self) -> usize {
        self.keys.len().div_ceil(self.page_size).max(1)
    }

    /// Active sort mode.
    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    /// Filter text used by [`SortMode::Filtered`].
    pub fn filter_text(&self) -> Option<&str> {
        self.filter_text.as_deref()
    }

    /// Active search query, if any.
    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    /// Indices of keys matching the active search.
    pub fn search_matches(&self) -> &[usize] {
        &self.search_matches
    }

    /// Index into [`search_matches`](Self::search_matches) last jumped to.
    pub fn search_cursor(&self) -> usize {
        self.search_cursor
    }

    /// The selected key, or `None` when the list is empty.
    pub fn selected(&self) -> Option<&str> {
        self.keys.get(self.position).map(String::as_str)
    }

    /// Index of the first key on the current page.
    pub fn page_start(&self) -> usize {
        (self.page - 1) * self.page_size
    }

    /// Keys visible on the current page.
    pub fn page_keys(&self) -> &[String] {
        let start = self.page_start().min(self.keys.len());
        let end = (start + self.page_size).min(self.keys.len());
        &self.keys[start..end]
    }

    /// Changes the page size, keeping the selected key.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.sync_page();
    }

    /// Sets or clears the filter text. Takes effect on the next sort or sync.
    pub fn set_filter(&mut self, text: Option<String>) {
        self.filter_text = text.filter(|t| !t.is_empty());
    }

    /// Replaces the keys.
    ///
    /// Position and page survive unless the old position is out of range,
    /// in which case both reset to the first key. An active search is
    /// re-run against the new keys without moving the selection.
    pub fn refresh(&mut self, new_keys: Vec<String>) {
        self.keys = new_keys;
        if self.position >= self.keys.len() {
            self.position = 0;
        }
        self.sync_page();
        self.rematch_search();
    }

    /// Recomputes keys from `source` using the current sort mode.
    pub fn sync<S: ListSource + ?Sized>(&mut self, source: &S) -> SortOutcome {
        self.apply_sort(self.sort_mode, source)
    }

    /// Moves the selection.
    ///
    /// Never wraps: `Down` on the last key and `Right` on the last page are
    /// no-ops, as are `Up` on the first key and `Left` on the first page.
    pub fn navigate(&mut self, direction: Direction) {
        if self.keys.is_empty() {
            return;
        }
        match direction {
            Direction::Up => {
                self.position = self.position.saturating_sub(1);
            }
            Direction::Down => {
                if self.position + 1 < self.keys.len() {
                    self.position += 1;
                }
            }
            Direction::Left => {
                if self.page > 1 {
                    self.position = (self.page - 2) * self.page_size;
                }
            }
            Direction::Right => {
                if self.page < self.page_count() {
                    self.position = self.page * self.page_size;
                }
            }
        }
        self.sync_page();
    }

    /// Re-orders the keys drawn from `source` according to `mode`.
    ///
    /// When `Filtered` keeps nothing, the view falls back to `ByName`, the
    /// filter is cleared and [`SortOutcome::FilterEmpty`] is returned so
    /// the caller can tell the user.
    pub fn apply_sort<S: ListSource + ?Sized>(
        &mut self,
        mode: SortMode,
        source: &S,
    ) -> SortOutcome {
        let mut outcome = SortOutcome::Applied;
        let mut keys = ordered_keys(mode, self.filter_text.as_deref(), source);
        let mut mode = mode;
        if mode == SortMode::Filtered && keys.is_empty() {
            tracing::debug!(filter = ?self.filter_text, "filter matched nothing, sorting by name");
            mode = SortMode::ByName;
            self.filter_text = None;
            keys = ordered_keys(mode, None, source);
            outcome = SortOutcome::FilterEmpty;
        }
        self.sort_mode = mode;
        self.refresh(keys);
        outcome
    }

    /// Searches key names for `query` and jumps to the first match.
    ///
    /// With no matches the selection stays where it is. An empty query
    /// clears the search.
    pub fn search(&mut self, query: &str) {
        if query.is_empty() {
            self.clear_search();
            return;
        }
        self.search_query = Some(query.to_string());
        self.search_matches = match_indices(&self.keys, query);
        self.search_cursor = 0;
        if let Some(&first) = self.search_matches.first() {
            self.position = first;
            self.sync_page();
        }
    }

    /// Jumps to the next match, cycling back to the first after the last.
    ///
    /// Returns the new cursor, or `None` when there are no matches.
    pub fn search_next(&mut self) -> Option<usize> {
        if self.search_matches.is_empty() {
            return None;
        }
        self.search_cursor = (self.search_cursor + 1) % self.search_matches.len();
        self.position = self.search_matches[self.search_cursor];
        self.sync_page();
        Some(self.search_cursor)
    }

    /// Drops the active search.
    pub fn clear_search(&mut self) {
        self.search_query = None;
        self.search_matches.clear();
        self.search_cursor = 0;
    }

    fn sync_page(&mut self) {
        if self.keys.is_empty() {
            self.position = 0;
        }
        self.page = 1 + self.position / self.page_size;
    }

    fn rematch_search(&mut self) {
        let Some(query) = self.search_query.as_deref() else {
            return;
        };
        self.search_matches = match_indices(&self.keys, query);
        if self.search_cursor >= self.search_matches.len() {
            self.search_cursor = 0;
        }
    }
}

fn match_indices(keys: &[String], query: &str) -> Vec<usize> {
    keys.iter()
        .enumerate()
        .filter(|(_, key)| key.contains(query))
        .map(|(i, _)| i)
        .collect()
}

fn ordered_keys<S: ListSource + ?Sized>(
    mode: SortMode,
    filter: Option<&str>,
    source: &S,
) -> Vec<String> {
    let mut entries = source.tagged_keys();
    match mode {
        SortMode::ByName => entries.sort_by(|a, b| a.0.cmp(&b.0)),
        SortMode::ByType => entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0))),
        SortMode::Filtered => {
            let needle = filter.unwrap_or_default();
            entries.retain(|(key, tag)| key.contains(needle) || tag.contains(needle));
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }
    }
    entries.into_iter().map(|(key, _)| key).collect()
}
