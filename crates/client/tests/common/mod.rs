//! Scripted in-memory backend for controller tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use console_client::api::ApiError;
use console_client::backend::{ListRequest, ResourceBackend};
use console_client::controller::{ControllerOptions, ListController};
use console_core::listing::users::{UserFilters, UserStats, UserSummary, Users};
use console_core::listing::{matches_search, PageData};
use console_core::types::DbId;

pub type PageResult = Result<PageData<UserSummary>, ApiError>;

enum Script {
    /// Resolve the next fetch with whatever is sent on the channel.
    Gate(oneshot::Receiver<PageResult>),
    Fail(ApiError),
}

/// Serves pages out of an in-memory user table. Individual fetches can be
/// scripted to fail or to wait for a response sent by the test.
#[derive(Default)]
pub struct ScriptedBackend {
    users: Mutex<Vec<UserSummary>>,
    scripts: Mutex<VecDeque<Script>>,
    mutation_failures: Mutex<VecDeque<ApiError>>,
    requests: Mutex<Vec<ListRequest<UserFilters>>>,
    created: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedBackend {
    pub fn with_users(count: usize) -> Arc<Self> {
        let backend = Self::default();
        *backend.users.lock().unwrap() = (1..=count as DbId).map(user).collect();
        Arc::new(backend)
    }

    /// The next fetch waits for a response on the returned sender.
    pub fn gate_next(&self) -> oneshot::Sender<PageResult> {
        let (tx, rx) = oneshot::channel();
        self.scripts.lock().unwrap().push_back(Script::Gate(rx));
        tx
    }

    pub fn fail_next(&self, status: u16) {
        self.scripts.lock().unwrap().push_back(Script::Fail(ApiError::Status {
            status,
            body: "backend unavailable".into(),
        }));
    }

    pub fn fail_next_mutation(&self, err: ApiError) {
        self.mutation_failures.lock().unwrap().push_back(err);
    }

    pub fn requests(&self) -> Vec<ListRequest<UserFilters>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn created(&self) -> Vec<serde_json::Value> {
        self.created.lock().unwrap().clone()
    }

    /// Page `request` out of the table the way the console backend does.
    pub fn serve(&self, request: &ListRequest<UserFilters>) -> PageData<UserSummary> {
        let users = self.users.lock().unwrap();
        let matching: Vec<_> = users
            .iter()
            .filter(|u| matches_search(&request.filters.search, &[u.username.as_str(), u.email.as_str()]))
            .cloned()
            .collect();
        let per_page = request.per_page.max(1);
        let total = matching.len() as u64;
        let last_page = (total as u32).div_ceil(per_page).max(1);
        let skip = ((request.page - 1) * per_page) as usize;
        PageData {
            items: matching.into_iter().skip(skip).take(per_page as usize).collect(),
            current_page: request.page,
            last_page,
            total,
            per_page,
        }
    }

    fn take_mutation_failure(&self) -> Result<(), ApiError> {
        match self.mutation_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceBackend<Users> for ScriptedBackend {
    async fn fetch_page(&self, request: &ListRequest<UserFilters>) -> PageResult {
        self.requests.lock().unwrap().push(request.clone());
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Script::Gate(rx)) => rx.await.unwrap_or_else(|_| {
                Err(ApiError::Status {
                    status: 499,
                    body: "gate dropped".into(),
                })
            }),
            Some(Script::Fail(err)) => Err(err),
            None => Ok(self.serve(request)),
        }
    }

    async fn fetch_stats(&self) -> Result<UserStats, ApiError> {
        let users = self.users.lock().unwrap();
        Ok(UserStats {
            total: users.len() as u64,
            active: users.iter().filter(|u| u.status == "active").count() as u64,
            ..Default::default()
        })
    }

    async fn create(&self, payload: &serde_json::Value) -> Result<(), ApiError> {
        self.take_mutation_failure()?;
        self.created.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn update(&self, _id: DbId, _payload: &serde_json::Value) -> Result<(), ApiError> {
        self.take_mutation_failure()
    }

    async fn delete(&self, id: DbId) -> Result<(), ApiError> {
        self.take_mutation_failure()?;
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }
}

pub fn user(id: DbId) -> UserSummary {
    UserSummary {
        id,
        email: format!("user{id}@example.com"),
        username: format!("user{id:03}"),
        first_name: None,
        last_name: None,
        role: "member".into(),
        status: if id % 2 == 0 { "active" } else { "inactive" }.into(),
        organization_id: Some(1),
        email_verified_at: None,
        last_login_at: None,
        created_at: "2026-01-01T00:00:00Z".parse().unwrap(),
    }
}

pub fn controller(backend: &Arc<ScriptedBackend>) -> ListController<Users> {
    let backend: Arc<dyn ResourceBackend<Users>> = backend.clone();
    ListController::new(backend, ControllerOptions::default())
}

/// Yield until the backend has seen `count` fetches.
pub async fn wait_for_requests(backend: &ScriptedBackend, count: usize) {
    for _ in 0..1_000 {
        if backend.request_count() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("backend saw {} requests, expected {count}", backend.request_count());
}
