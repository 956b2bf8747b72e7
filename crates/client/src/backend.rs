//! The seam list controllers fetch and mutate through.

use async_trait::async_trait;

use console_core::listing::{ListFilters, ManagedResource, PageData};
use console_core::types::DbId;

use crate::api::{ApiError, ConsoleApi};

/// Parameters of a collection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest<F> {
    pub page: u32,
    pub per_page: u32,
    pub filters: F,
}

impl<F: ListFilters> ListRequest<F> {
    /// `page`, `per_page`, then the non-empty filter parameters.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        pairs.extend(self.filters.query_pairs());
        pairs
    }
}

/// Backend operations for one managed resource.
#[async_trait]
pub trait ResourceBackend<R: ManagedResource>: Send + Sync {
    async fn fetch_page(
        &self,
        request: &ListRequest<R::Filters>,
    ) -> Result<PageData<R::Item>, ApiError>;

    async fn fetch_stats(&self) -> Result<R::Stats, ApiError>;

    async fn create(&self, payload: &serde_json::Value) -> Result<(), ApiError>;

    async fn update(&self, id: DbId, payload: &serde_json::Value) -> Result<(), ApiError>;

    async fn delete(&self, id: DbId) -> Result<(), ApiError>;
}

#[async_trait]
impl<R: ManagedResource> ResourceBackend<R> for ConsoleApi {
    async fn fetch_page(
        &self,
        request: &ListRequest<R::Filters>,
    ) -> Result<PageData<R::Item>, ApiError> {
        self.list::<R>(request).await
    }

    async fn fetch_stats(&self) -> Result<R::Stats, ApiError> {
        self.stats::<R>().await
    }

    async fn create(&self, payload: &serde_json::Value) -> Result<(), ApiError> {
        ConsoleApi::create::<R, _>(self, payload).await
    }

    async fn update(&self, id: DbId, payload: &serde_json::Value) -> Result<(), ApiError> {
        ConsoleApi::update::<R, _>(self, id, payload).await
    }

    async fn delete(&self, id: DbId) -> Result<(), ApiError> {
        ConsoleApi::delete::<R>(self, id).await
    }
}
