//! Managed list state shared by every console resource table.
//!
//! A table is four orthogonal pieces of state:
//!
//! - `RAW`: the last page of items fetched from the server;
//! - `VIEW`: `RAW` through the local filter predicate, then sorted. Derived
//!   on demand by [`apply_view`] and never stored;
//! - `SORT`: [`SortState`], client-local over the current page;
//! - `PAGINATION`: [`Pagination`], totals always come from the server.
//!
//! Each resource plugs its item, filter, sort-field and statistics types in
//! through [`ManagedResource`].

pub mod clients;
pub mod organizations;
pub mod pagination;
pub mod permissions;
pub mod roles;
pub mod sorting;
pub mod users;
pub mod view;

use std::cmp::Ordering;
use std::fmt::Debug;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub use pagination::{Pagination, PaginationUpdate};
pub use sorting::{SortOrder, SortState, SortUpdate};
pub use view::apply_view;

/// One page of a collection endpoint (`data` member of the response).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageData<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub last_page: u32,
    pub total: u64,
    pub per_page: u32,
}

/// Filter state of a resource table.
pub trait ListFilters: Clone + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Free-text search term. Changes to it are debounced before they are
    /// sent to the server.
    fn search(&self) -> &str;

    fn set_search(&mut self, search: &str);

    /// Query parameters sent to the collection endpoint. Empty filters are
    /// omitted.
    fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

/// A resource type managed by a console table.
pub trait ManagedResource: Send + Sync + 'static {
    type Item: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Filters: ListFilters;
    type SortField: Copy + Eq + Debug + FromStr<Err = CoreError> + Send + Sync + 'static;
    type Stats: Clone + Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Used in logs.
    const NAME: &'static str;
    /// Collection path relative to the API base URL.
    const PATH: &'static str;
    const DEFAULT_SORT: Self::SortField;

    /// Local predicate applied to `RAW` to derive `VIEW`.
    fn matches(filters: &Self::Filters, item: &Self::Item) -> bool;

    /// Ascending comparison of two items on `field`.
    fn compare(field: Self::SortField, a: &Self::Item, b: &Self::Item) -> Ordering;
}

// ---------------------------------------------------------------------------
// Predicate helpers
// ---------------------------------------------------------------------------

/// Case-insensitive substring match of `needle` against any of `haystacks`.
/// A blank needle matches everything.
pub fn matches_search(needle: &str, haystacks: &[&str]) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    haystacks
        .iter()
        .any(|hay| hay.to_lowercase().contains(&needle))
}

/// `None` matches everything; `Some(expected)` requires equality.
pub fn matches_exact<T: PartialEq + ?Sized>(expected: Option<&T>, actual: &T) -> bool {
    expected.map_or(true, |expected| expected == actual)
}

/// Push `(key, value)` when `value` is present and not blank.
pub(crate) fn push_pair(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        pairs.push((key, value.to_string()));
    }
}

/// Case-insensitive string ordering.
pub(crate) fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
