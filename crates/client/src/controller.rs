//! Managed list controller.
//!
//! One [`ListController`] drives one resource table. It owns the `RAW` page
//! of items, the local filter and sort state, server-driven pagination, and
//! the resource statistics. Fetches are last-request-wins: every load gets a
//! sequence number and a response is applied only if no newer load was
//! issued while it was in flight.
//!
//! The controller is cheap to clone; clones share state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use validator::Validate;

use console_core::listing::pagination::DEFAULT_ITEMS_PER_PAGE;
use console_core::listing::{
    apply_view, ListFilters, ManagedResource, PageData, Pagination, PaginationUpdate, SortState,
    SortUpdate,
};
use console_core::types::{DbId, FieldErrors};
use console_core::validation::field_errors;

use crate::api::ApiError;
use crate::backend::{ListRequest, ResourceBackend};
use crate::config::{ClientConfig, DEFAULT_SEARCH_DEBOUNCE_MS};
use crate::debounce::Debouncer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub items_per_page: u32,
    pub search_debounce: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }
}

impl From<&ClientConfig> for ControllerOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            items_per_page: config.items_per_page,
            search_debounce: config.search_debounce(),
        }
    }
}

/// What happened to a load once its response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced `RAW` and the pagination totals.
    Applied,
    /// A newer load was issued meanwhile; the response was dropped.
    Superseded,
    /// The request failed; `RAW` was kept and `error` set.
    Failed,
}

/// Errors from create, update and delete actions.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Rejected locally or by the backend, with per-field messages.
    #[error("Validation failed for {} field(s)", .0.len())]
    Invalid(FieldErrors),

    #[error(transparent)]
    Api(ApiError),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<ApiError> for ActionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation { errors, .. } => ActionError::Invalid(errors),
            other => ActionError::Api(other),
        }
    }
}

/// Point-in-time copy of a table's state. `items` is the `VIEW`.
pub struct ListSnapshot<R: ManagedResource> {
    pub items: Vec<R::Item>,
    /// Number of items in `RAW`, before local filtering.
    pub raw_count: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub pagination: Pagination,
    pub filters: R::Filters,
    pub sorting: SortState<R::SortField>,
    pub stats: Option<R::Stats>,
}

struct ListState<R: ManagedResource> {
    raw: Vec<R::Item>,
    loading: bool,
    error: Option<String>,
    /// Only updated from applied responses.
    pagination: Pagination,
    /// Page and page size of the latest load, applied or not. `retry` reuses it.
    requested_page: u32,
    requested_per_page: u32,
    filters: R::Filters,
    sorting: SortState<R::SortField>,
    stats: Option<R::Stats>,
    list_seq: u64,
    stats_seq: u64,
}

struct Inner<R: ManagedResource> {
    backend: Arc<dyn ResourceBackend<R>>,
    state: Mutex<ListState<R>>,
    debouncer: Debouncer,
}

pub struct ListController<R: ManagedResource> {
    inner: Arc<Inner<R>>,
}

impl<R: ManagedResource> Clone for ListController<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Next step of a load after its response was handled.
enum Step {
    Done(LoadOutcome),
    /// The requested page is past the end; fetch this page instead.
    Refetch(u32),
}

impl<R: ManagedResource> ListController<R> {
    pub fn new(backend: Arc<dyn ResourceBackend<R>>, options: ControllerOptions) -> Self {
        let pagination = Pagination::new(options.items_per_page);
        let state = ListState {
            raw: Vec::new(),
            loading: false,
            error: None,
            pagination,
            requested_page: pagination.current_page,
            requested_per_page: pagination.items_per_page,
            filters: R::Filters::default(),
            sorting: SortState::new(R::DEFAULT_SORT),
            stats: None,
            list_seq: 0,
            stats_seq: 0,
        };
        Self {
            inner: Arc::new(Inner {
                backend,
                state: Mutex::new(state),
                debouncer: Debouncer::new(options.search_debounce),
            }),
        }
    }

    // ---- reads ----

    pub fn snapshot(&self) -> ListSnapshot<R> {
        let state = self.lock();
        ListSnapshot {
            items: apply_view::<R>(&state.raw, &state.filters, &state.sorting),
            raw_count: state.raw.len(),
            loading: state.loading,
            error: state.error.clone(),
            pagination: state.pagination,
            filters: state.filters.clone(),
            sorting: state.sorting,
            stats: state.stats.clone(),
        }
    }

    /// `RAW` through the local filters, sorted.
    pub fn view(&self) -> Vec<R::Item> {
        let state = self.lock();
        apply_view::<R>(&state.raw, &state.filters, &state.sorting)
    }

    pub fn raw_items(&self) -> Vec<R::Item> {
        self.lock().raw.clone()
    }

    pub fn filters(&self) -> R::Filters {
        self.lock().filters.clone()
    }

    pub fn sorting(&self) -> SortState<R::SortField> {
        self.lock().sorting
    }

    pub fn pagination(&self) -> Pagination {
        self.lock().pagination
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn stats(&self) -> Option<R::Stats> {
        self.lock().stats.clone()
    }

    // ---- fetches ----

    /// Fetch `page` with `filters`, which become the table's filters.
    ///
    /// A page past the end of a shrunken collection is refetched once at the
    /// last page the server reports.
    pub async fn load(&self, page: u32, filters: R::Filters) -> LoadOutcome {
        let mut page = page.max(1);
        let mut refetched = false;
        loop {
            let (seq, request) = self.begin_load(page, &filters);
            let in_flight = InFlight {
                controller: self,
                seq,
                armed: true,
            };
            let result = self.inner.backend.fetch_page(&request).await;
            let step = self.finish_load(seq, &request, result, refetched);
            in_flight.disarm();
            match step {
                Step::Done(outcome) => return outcome,
                Step::Refetch(last_page) => {
                    page = last_page;
                    refetched = true;
                }
            }
        }
    }

    /// Repeat the latest load with the current filters. After a failed page
    /// change this asks for the page that failed, not the one on screen.
    pub async fn retry(&self) -> LoadOutcome {
        let (page, filters) = {
            let state = self.lock();
            (state.requested_page, state.filters.clone())
        };
        self.load(page, filters).await
    }

    /// Fetch the resource statistics. A failure leaves the previous
    /// statistics in place.
    pub async fn refresh_stats(&self) -> Result<(), ApiError> {
        let seq = {
            let mut state = self.lock();
            state.stats_seq += 1;
            state.stats_seq
        };

        let result = self.inner.backend.fetch_stats().await;

        let mut state = self.lock();
        if state.stats_seq != seq {
            return Ok(());
        }
        match result {
            Ok(stats) => {
                state.stats = Some(stats);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(resource = R::NAME, error = %err, "Failed to load statistics");
                Err(err)
            }
        }
    }

    // ---- state updates ----

    /// Patch the filters in place. `VIEW` reflects the change immediately.
    ///
    /// A change to the search term schedules a debounced reload of page 1;
    /// other filters are sent with the next load. Must be called within a
    /// Tokio runtime.
    pub fn update_filters(&self, patch: impl FnOnce(&mut R::Filters)) {
        let search_changed = {
            let mut state = self.lock();
            let before = state.filters.search().to_owned();
            patch(&mut state.filters);
            state.filters.search() != before
        };

        if search_changed {
            self.schedule_search_reload();
        }
    }

    /// Re-sort `VIEW`. Without an explicit order the same field flips the
    /// order and a new field starts ascending.
    pub fn update_sorting(&self, update: SortUpdate<R::SortField>) {
        let mut state = self.lock();
        state.sorting.apply(update);
        tracing::debug!(
            resource = R::NAME,
            sort_by = ?state.sorting.sort_by,
            sort_order = ?state.sorting.sort_order,
            "Sorting updated",
        );
    }

    /// Move to another page or change the page size, then fetch. A page-size
    /// change always goes back to page 1.
    pub async fn update_pagination(&self, update: PaginationUpdate) -> LoadOutcome {
        let (page, filters) = {
            let mut state = self.lock();
            let next = state.pagination.with_update(update);
            state.requested_per_page = next.items_per_page;
            (next.current_page, state.filters.clone())
        };
        self.load(page, filters).await
    }

    /// Restore default filters and fetch page 1. Pending search reloads are
    /// dropped.
    pub async fn reset_filters(&self) -> LoadOutcome {
        self.inner.debouncer.cancel();
        self.load(1, R::Filters::default()).await
    }

    // ---- actions ----

    /// Validate and create an item, then reload the current page and the
    /// statistics. A failure leaves `RAW` untouched.
    pub async fn create<F>(&self, form: &F) -> Result<(), ActionError>
    where
        F: Validate + Serialize + Sync,
    {
        let payload = Self::prepare(form)?;
        self.inner.backend.create(&payload).await?;
        tracing::info!(resource = R::NAME, "Item created");
        self.after_mutation().await;
        Ok(())
    }

    pub async fn update<F>(&self, id: DbId, form: &F) -> Result<(), ActionError>
    where
        F: Validate + Serialize + Sync,
    {
        let payload = Self::prepare(form)?;
        self.inner.backend.update(id, &payload).await?;
        tracing::info!(resource = R::NAME, id, "Item updated");
        self.after_mutation().await;
        Ok(())
    }

    pub async fn delete(&self, id: DbId) -> Result<(), ActionError> {
        self.inner.backend.delete(id).await?;
        tracing::info!(resource = R::NAME, id, "Item deleted");
        self.after_mutation().await;
        Ok(())
    }

    // ---- private helpers ----

    fn lock(&self) -> MutexGuard<'_, ListState<R>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_load(&self, page: u32, filters: &R::Filters) -> (u64, ListRequest<R::Filters>) {
        let mut state = self.lock();
        state.list_seq += 1;
        state.loading = true;
        state.filters = filters.clone();
        state.requested_page = page;

        let request = ListRequest {
            page,
            per_page: state.requested_per_page,
            filters: filters.clone(),
        };
        tracing::debug!(
            resource = R::NAME,
            seq = state.list_seq,
            page,
            per_page = request.per_page,
            "Load issued",
        );
        (state.list_seq, request)
    }

    fn finish_load(
        &self,
        seq: u64,
        request: &ListRequest<R::Filters>,
        result: Result<PageData<R::Item>, ApiError>,
        refetched: bool,
    ) -> Step {
        let mut state = self.lock();
        if state.list_seq != seq {
            tracing::debug!(resource = R::NAME, seq, latest = state.list_seq, "Stale response dropped");
            return Step::Done(LoadOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let last_page = page.last_page.max(1);
                if !refetched && page.items.is_empty() && page.total > 0 && request.page > last_page {
                    return Step::Refetch(last_page);
                }

                state.pagination.apply_page_meta(&page);
                state.requested_page = state.pagination.current_page;
                state.requested_per_page = state.pagination.items_per_page;
                state.raw = page.items;
                state.error = None;
                state.loading = false;
                tracing::debug!(
                    resource = R::NAME,
                    seq,
                    items = state.raw.len(),
                    total = state.pagination.total_items,
                    "Page applied",
                );
                Step::Done(LoadOutcome::Applied)
            }
            Err(err) => {
                tracing::warn!(resource = R::NAME, seq, error = %err, "Failed to load page");
                state.error = Some(format!("Failed to load {}: {err}", R::NAME));
                state.loading = false;
                Step::Done(LoadOutcome::Failed)
            }
        }
    }

    fn schedule_search_reload(&self) {
        let weak: Weak<Inner<R>> = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let controller = ListController { inner };
            let filters = controller.filters();
            tracing::debug!(resource = R::NAME, search = filters.search(), "Search settled");
            controller.load(1, filters).await;
        });
    }

    fn prepare<F: Validate + Serialize>(form: &F) -> Result<serde_json::Value, ActionError> {
        if let Err(errors) = form.validate() {
            return Err(ActionError::Invalid(field_errors(&errors)));
        }
        Ok(serde_json::to_value(form)?)
    }

    async fn after_mutation(&self) {
        self.retry().await;
        if let Err(err) = self.refresh_stats().await {
            tracing::debug!(resource = R::NAME, error = %err, "Keeping previous statistics");
        }
    }
}

/// Clears `loading` if a load future is dropped before its response is
/// handled and no newer load was issued meanwhile.
struct InFlight<'a, R: ManagedResource> {
    controller: &'a ListController<R>,
    seq: u64,
    armed: bool,
}

impl<R: ManagedResource> InFlight<'_, R> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<R: ManagedResource> Drop for InFlight<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.controller.lock();
        if state.list_seq == self.seq {
            state.loading = false;
            tracing::debug!(resource = R::NAME, seq = self.seq, "Load dropped before completion");
        }
    }
}
