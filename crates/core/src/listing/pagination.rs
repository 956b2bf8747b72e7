//! Server-driven pagination state.

use serde::Serialize;

use super::PageData;

/// Page size used when none is configured.
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 15;

/// Largest page size the console backend accepts.
pub const MAX_ITEMS_PER_PAGE: u32 = 100;

/// Pagination of a resource table.
///
/// `total_items` and `total_pages` are only ever taken from a server
/// response. `current_page` stays within `[1, max(total_pages, 1)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

/// A pagination change requested by the table footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationUpdate {
    pub current_page: Option<u32>,
    pub items_per_page: Option<u32>,
}

impl PaginationUpdate {
    pub fn page(current_page: u32) -> Self {
        Self {
            current_page: Some(current_page),
            items_per_page: None,
        }
    }

    pub fn per_page(items_per_page: u32) -> Self {
        Self {
            current_page: None,
            items_per_page: Some(items_per_page),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}

impl Pagination {
    pub fn new(items_per_page: u32) -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_items: 0,
            items_per_page: clamp_items_per_page(items_per_page),
        }
    }

    /// Clamp `page` to `[1, max(total_pages, 1)]`.
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages.max(1))
    }

    /// The pagination a request for `update` should be issued with.
    ///
    /// A page-size change always restarts at page 1, whatever page was
    /// requested alongside it.
    pub fn with_update(&self, update: PaginationUpdate) -> Self {
        let mut next = *self;
        match (update.items_per_page, update.current_page) {
            (Some(per_page), _) => {
                next.items_per_page = clamp_items_per_page(per_page);
                next.current_page = 1;
            }
            (None, Some(page)) => next.current_page = self.clamp_page(page),
            (None, None) => {}
        }
        next
    }

    /// Take totals from a server page and re-clamp `current_page`.
    pub fn apply_page_meta<T>(&mut self, page: &PageData<T>) {
        self.total_items = page.total;
        self.total_pages = page.last_page.max(1);
        if page.per_page > 0 {
            self.items_per_page = page.per_page;
        }
        self.current_page = self.clamp_page(page.current_page);
    }
}

pub fn clamp_items_per_page(items_per_page: u32) -> u32 {
    items_per_page.clamp(1, MAX_ITEMS_PER_PAGE)
}
