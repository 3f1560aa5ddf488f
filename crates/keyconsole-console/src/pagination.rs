//! Page cursor for the key table

use keyconsole_core::{ConsoleConfig, PaginationInfo};

/// Client-held paging state plus the totals of the last response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    page: u32,
    page_size: u32,
    size_options: Vec<u32>,
    info: PaginationInfo,
}

impl Default for PageState {
    fn default() -> Self {
        Self::from_config(&ConsoleConfig::default())
    }
}

impl PageState {
    /// Start on page 1 with the configured default size
    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self {
            page: 1,
            page_size: config.default_page_size.max(1),
            size_options: config.page_size_options.clone(),
            info: PaginationInfo::default(),
        }
    }

    /// Current page, 1-based
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Rows per page
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Sizes offered by the page-size selector
    pub fn size_options(&self) -> &[u32] {
        &self.size_options
    }

    /// Total rows reported by the last response
    pub const fn total(&self) -> u64 {
        self.info.total
    }

    /// Total pages reported by the last response
    pub const fn total_pages(&self) -> u32 {
        self.info.total_pages
    }

    /// Whether the "previous" control is enabled
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Whether the "next" control is enabled
    pub const fn has_next(&self) -> bool {
        self.page < self.info.total_pages
    }

    /// Go forward one page; ignored when the control is disabled
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page; ignored when the control is disabled
    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page`; values below 1 are raised to 1
    pub fn go_to(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Change the page size and return to page 1; zero is ignored
    pub fn set_page_size(&mut self, page_size: u32) {
        if page_size == 0 {
            return;
        }
        self.page_size = page_size;
        self.page = 1;
    }

    /// Return to page 1, e.g. after the filter changed
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Record the totals of a list response
    pub fn apply(&mut self, info: PaginationInfo) {
        self.info = PaginationInfo {
            total: info.total,
            total_pages: info.total_pages.max(1),
        };
    }

    /// "Page 2 of 5"
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page, self.info.total_pages)
    }

    /// "42 records"
    pub fn total_label(&self) -> String {
        format!("{} records", self.info.total)
    }
}
