//! Derivation of the rendered `VIEW` from `RAW`.

use super::{ManagedResource, SortOrder, SortState};

/// Filter `items` with the resource's local predicate, then sort.
///
/// The sort is stable: items with equal keys keep their `RAW` order in both
/// directions.
pub fn apply_view<R: ManagedResource>(
    items: &[R::Item],
    filters: &R::Filters,
    sort: &SortState<R::SortField>,
) -> Vec<R::Item> {
    let mut view: Vec<R::Item> = items
        .iter()
        .filter(|item| R::matches(filters, item))
        .cloned()
        .collect();

    view.sort_by(|a, b| {
        let ordering = R::compare(sort.sort_by, a, b);
        match sort.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    view
}
