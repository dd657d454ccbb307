//! Headless state of a searchable, optionally tabbed select.

use funnel_core::{SelectOption, SelectTab};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectState<T = String> {
    items: Vec<SelectOption<T>>,
    tabs: Vec<SelectTab<T>>,
    selected: Vec<SelectOption<T>>,
    multiple: bool,
    max_selected: Option<usize>,
    searchable: bool,
    disabled: bool,
    is_open: bool,
    search_term: String,
    active_tab: usize,
}

impl<T: Clone + PartialEq> SelectState<T> {
    /// A single-choice select over a flat list.
    pub fn new(items: Vec<SelectOption<T>>) -> Self {
        Self {
            items,
            tabs: Vec::new(),
            selected: Vec::new(),
            multiple: false,
            max_selected: None,
            searchable: true,
            disabled: false,
            is_open: false,
            search_term: String::new(),
            active_tab: 0,
        }
    }

    /// A single-choice select whose items come from the active tab.
    pub fn with_tabs(tabs: Vec<SelectTab<T>>) -> Self {
        Self {
            tabs,
            ..Self::new(Vec::new())
        }
    }

    /// Allow several selections, optionally capped.
    pub fn multiple(mut self, max_selected: Option<usize>) -> Self {
        self.multiple = true;
        self.max_selected = max_selected;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.is_open = false;
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_items(&mut self, items: Vec<SelectOption<T>>) {
        self.items = items;
    }

    // ------------------------------------------------------------------------
    // Tabs
    // ------------------------------------------------------------------------

    pub fn has_tabs(&self) -> bool {
        !self.tabs.is_empty()
    }

    pub fn active_tab(&self) -> Option<&SelectTab<T>> {
        self.tabs.get(self.active_tab)
    }

    pub fn active_tab_index(&self) -> usize {
        self.active_tab
    }

    /// Switch tabs. Out-of-range indices are ignored.
    pub fn switch_tab(&mut self, index: usize) -> bool {
        if index >= self.tabs.len() {
            return false;
        }
        self.active_tab = index;
        true
    }

    /// Index of the tab with the given value.
    pub fn tab_index(&self, value: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.value == value)
    }

    // ------------------------------------------------------------------------
    // Items and search
    // ------------------------------------------------------------------------

    pub fn display_items(&self) -> &[SelectOption<T>] {
        if self.has_tabs() {
            return self.active_tab().map(|t| t.items.as_slice()).unwrap_or(&[]);
        }
        &self.items
    }

    /// Items whose label contains the search term, ignoring case.
    pub fn filtered_items(&self) -> Vec<&SelectOption<T>> {
        let term = self.search_term.trim().to_lowercase();
        self.display_items()
            .iter()
            .filter(|item| {
                term.is_empty() || !self.searchable || item.label.to_lowercase().contains(&term)
            })
            .collect()
    }

    pub fn search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Opening and closing both reset the search term.
    pub fn open(&mut self) -> bool {
        if self.disabled {
            return false;
        }
        self.is_open = true;
        self.search_term.clear();
        true
    }

    pub fn close(&mut self) {
        self.is_open = false;
        self.search_term.clear();
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn selected(&self) -> &[SelectOption<T>] {
        &self.selected
    }

    /// The selection of a single-choice select.
    pub fn value(&self) -> Option<&SelectOption<T>> {
        self.selected.first()
    }

    pub fn is_selected(&self, value: &T) -> bool {
        self.selected.iter().any(|s| &s.value == value)
    }

    /// Select an option. Single mode replaces and closes; multiple mode
    /// appends up to the cap. Returns whether the selection changed.
    pub fn select(&mut self, option: SelectOption<T>) -> bool {
        if self.disabled {
            return false;
        }
        if !self.multiple {
            self.selected = vec![option];
            self.close();
            return true;
        }
        if self.is_selected(&option.value) {
            return false;
        }
        if self.max_selected.is_some_and(|max| self.selected.len() >= max) {
            return false;
        }
        self.selected.push(option);
        true
    }

    /// Replace the whole selection, as a bound value would.
    pub fn set_value(&mut self, value: Option<SelectOption<T>>) -> bool {
        if self.disabled {
            return false;
        }
        self.selected = value.into_iter().collect();
        true
    }

    pub fn deselect(&mut self, value: &T) -> bool {
        if self.disabled {
            return false;
        }
        let before = self.selected.len();
        self.selected.retain(|s| &s.value != value);
        self.selected.len() != before
    }

    pub fn clear(&mut self) -> bool {
        if self.disabled {
            return false;
        }
        self.selected.clear();
        true
    }
}
