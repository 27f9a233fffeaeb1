//! Zero-based page cursor shared by the list screens

use crate::types::Page;
use serde::{Deserialize, Serialize};

/// Default number of rows requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size the console will request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Position within a paginated collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Zero-based page index
    pub page: u32,
    /// Rows per page
    pub size: u32,
    /// Total pages reported by the last successful fetch
    pub total_pages: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageCursor {
    /// Cursor on the first page with nothing loaded yet
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self {
            page: 0,
            size: size.clamp(1, MAX_PAGE_SIZE),
            total_pages: 0,
        }
    }

    /// Whether "previous" is enabled
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Whether "next" is enabled; disabled once `page >= total_pages - 1`
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages
    }

    /// Index "previous" would move to, floored at 0
    #[must_use]
    pub const fn previous_page(&self) -> u32 {
        self.page.saturating_sub(1)
    }

    /// Index "next" would move to, or `None` when on the last page
    #[must_use]
    pub const fn next_page(&self) -> Option<u32> {
        if self.has_next() {
            Some(self.page + 1)
        } else {
            None
        }
    }

    /// Human-facing one-based page label, e.g. `Page 2 of 5`
    #[must_use]
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.page.saturating_add(1), self.total_pages)
    }

    /// Take the total page count from a fetched page
    pub const fn absorb<T>(&mut self, page: &Page<T>) {
        self.total_pages = page.total_pages;
    }

    /// Query-string pairs for this cursor
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [("page", self.page.to_string()), ("size", self.size.to_string())]
    }
}
