mod common;

use std::time::Duration;

use assert_matches::assert_matches;

use console_client::api::ApiError;
use console_client::controller::{ActionError, ControllerOptions, ListController, LoadOutcome};
use console_core::listing::users::{UserFilters, UserSortField, Users};
use console_core::listing::{PageData, PaginationUpdate, SortOrder, SortUpdate};
use console_core::validation::CreateUserForm;

use common::{controller, user, wait_for_requests, ScriptedBackend};

fn ids(items: &[console_core::listing::users::UserSummary]) -> Vec<i64> {
    items.iter().map(|u| u.id).collect()
}

#[tokio::test]
async fn load_applies_page_and_server_totals() {
    let backend = ScriptedBackend::with_users(40);
    let controller = controller(&backend);

    assert_eq!(controller.load(1, UserFilters::default()).await, LoadOutcome::Applied);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.raw_count, 15);
    assert_eq!(snapshot.pagination.total_items, 40);
    assert_eq!(snapshot.pagination.total_pages, 3);
    assert_eq!(snapshot.pagination.current_page, 1);
    assert!(!snapshot.loading);
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn older_response_arriving_last_is_dropped() {
    let backend = ScriptedBackend::with_users(40);
    let controller = controller(&backend);
    let first_gate = backend.gate_next();
    let second_gate = backend.gate_next();

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load(1, UserFilters::default()).await }
    });
    wait_for_requests(&backend, 1).await;
    let second = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load(2, UserFilters::default()).await }
    });
    wait_for_requests(&backend, 2).await;
    assert!(controller.is_loading());

    let requests = backend.requests();
    second_gate.send(Ok(backend.serve(&requests[1]))).unwrap();
    assert_eq!(second.await.unwrap(), LoadOutcome::Applied);

    first_gate.send(Ok(backend.serve(&requests[0]))).unwrap();
    assert_eq!(first.await.unwrap(), LoadOutcome::Superseded);

    assert_eq!(ids(&controller.raw_items()), (16..=30).collect::<Vec<_>>());
    assert_eq!(controller.pagination().current_page, 2);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn stale_failure_does_not_set_error() {
    let backend = ScriptedBackend::with_users(5);
    let controller = controller(&backend);
    let first_gate = backend.gate_next();

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load(1, UserFilters::default()).await }
    });
    wait_for_requests(&backend, 1).await;
    assert_eq!(controller.retry().await, LoadOutcome::Applied);

    first_gate
        .send(Err(ApiError::Status {
            status: 500,
            body: "boom".into(),
        }))
        .unwrap();
    assert_eq!(first.await.unwrap(), LoadOutcome::Superseded);
    assert!(controller.error().is_none());
    assert_eq!(controller.raw_items().len(), 5);
}

#[tokio::test]
async fn failed_load_keeps_previous_items() {
    let backend = ScriptedBackend::with_users(20);
    let controller = controller(&backend);
    controller.load(1, UserFilters::default()).await;
    let before = controller.raw_items();

    backend.fail_next(503);
    assert_eq!(controller.retry().await, LoadOutcome::Failed);

    assert_eq!(controller.raw_items(), before);
    let error = controller.error().unwrap();
    assert!(error.contains("users"), "{error}");
    assert!(!controller.is_loading());

    assert_eq!(controller.retry().await, LoadOutcome::Applied);
    assert!(controller.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn search_keystrokes_collapse_into_one_request() {
    let backend = ScriptedBackend::with_users(40);
    let controller = controller(&backend);

    for term in ["u", "us", "user00"] {
        controller.update_filters(|f| f.search = term.into());
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(backend.request_count(), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].filters.search, "user00");
    assert_eq!(requests[0].page, 1);
    assert_eq!(controller.pagination().total_items, 9);
}

#[tokio::test(start_paused = true)]
async fn search_filters_view_before_the_reload() {
    let backend = ScriptedBackend::with_users(15);
    let controller = controller(&backend);
    controller.load(1, UserFilters::default()).await;

    controller.update_filters(|f| f.search = "user007".into());

    assert_eq!(ids(&controller.view()), vec![7]);
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn non_search_filters_apply_locally_without_fetching() {
    let backend = ScriptedBackend::with_users(10);
    let controller = controller(&backend);
    controller.load(1, UserFilters::default()).await;

    controller.update_filters(|f| f.status = Some("active".into()));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(backend.request_count(), 1);
    assert_eq!(controller.view().len(), 5);
    assert_eq!(controller.raw_items().len(), 10);
}

#[tokio::test]
async fn page_size_change_returns_to_first_page() {
    let backend = ScriptedBackend::with_users(60);
    let controller = controller(&backend);
    controller.load(3, UserFilters::default()).await;
    assert_eq!(controller.pagination().current_page, 3);

    let outcome = controller.update_pagination(PaginationUpdate::per_page(25)).await;

    assert_eq!(outcome, LoadOutcome::Applied);
    let last = backend.requests().pop().unwrap();
    assert_eq!((last.page, last.per_page), (1, 25));
    let pagination = controller.pagination();
    assert_eq!(pagination.current_page, 1);
    assert_eq!(pagination.items_per_page, 25);
    assert_eq!(pagination.total_pages, 3);
}

#[tokio::test]
async fn page_request_is_clamped_to_known_total() {
    let backend = ScriptedBackend::with_users(40);
    let controller = controller(&backend);
    controller.load(1, UserFilters::default()).await;

    controller.update_pagination(PaginationUpdate::page(9)).await;

    assert_eq!(backend.requests().pop().unwrap().page, 3);
    assert_eq!(controller.pagination().current_page, 3);
}

#[tokio::test(start_paused = true)]
async fn reset_filters_drops_pending_search() {
    let backend = ScriptedBackend::with_users(20);
    let controller = controller(&backend);

    controller.update_filters(|f| f.search = "user01".into());
    assert_eq!(controller.reset_filters().await, LoadOutcome::Applied);
    tokio::time::sleep(Duration::from_secs(1)).await;

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].filters, UserFilters::default());
    assert_eq!(controller.filters(), UserFilters::default());
}

#[tokio::test]
async fn sorting_is_local_and_toggles() {
    let backend = ScriptedBackend::with_users(5);
    let controller = controller(&backend);
    controller.load(1, UserFilters::default()).await;

    controller.update_sorting(SortUpdate::toggle(UserSortField::Username));
    assert_eq!(controller.sorting().sort_order, SortOrder::Asc);
    assert_eq!(ids(&controller.view()), vec![1, 2, 3, 4, 5]);

    controller.update_sorting(SortUpdate::toggle(UserSortField::Username));
    assert_eq!(controller.sorting().sort_order, SortOrder::Desc);
    assert_eq!(ids(&controller.view()), vec![5, 4, 3, 2, 1]);

    controller.update_sorting(SortUpdate::explicit(UserSortField::Email, SortOrder::Desc));
    assert_eq!(controller.sorting().sort_by, UserSortField::Email);
    assert_eq!(controller.sorting().sort_order, SortOrder::Desc);

    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn deleting_last_item_on_last_page_moves_back() {
    let backend = ScriptedBackend::with_users(16);
    let controller = controller(&backend);
    controller.load(2, UserFilters::default()).await;
    assert_eq!(ids(&controller.raw_items()), vec![16]);

    controller.delete(16).await.unwrap();

    let pagination = controller.pagination();
    assert_eq!(pagination.current_page, 1);
    assert_eq!(pagination.total_pages, 1);
    assert_eq!(controller.raw_items().len(), 15);
    assert_eq!(controller.stats().unwrap().total, 15);
}

#[tokio::test]
async fn empty_collection_keeps_one_page() {
    let backend = ScriptedBackend::with_users(0);
    let controller = controller(&backend);

    assert_eq!(controller.load(4, UserFilters::default()).await, LoadOutcome::Applied);

    let pagination = controller.pagination();
    assert_eq!(pagination.total_pages, 1);
    assert_eq!(pagination.current_page, 1);
    assert!(controller.raw_items().is_empty());
}

fn create_form() -> CreateUserForm {
    CreateUserForm {
        email: "new@example.com".into(),
        username: "newcomer".into(),
        first_name: None,
        last_name: None,
        password: "correct horse".into(),
        password_confirmation: "correct horse".into(),
        role: "member".into(),
        status: "active".into(),
        organization_id: None,
        permissions: vec![],
    }
}

#[tokio::test]
async fn invalid_form_is_rejected_before_submission() {
    let backend = ScriptedBackend::with_users(3);
    let controller = controller(&backend);
    let mut form = create_form();
    form.password_confirmation = "something else".into();

    let err = controller.create(&form).await.unwrap_err();

    assert_matches!(err, ActionError::Invalid(fields) if fields.contains_key("password_confirmation"));
    assert!(backend.created().is_empty());
}

#[tokio::test]
async fn backend_validation_errors_map_to_fields() {
    let backend = ScriptedBackend::with_users(3);
    let controller = controller(&backend);
    controller.load(1, UserFilters::default()).await;
    backend.fail_next_mutation(ApiError::Validation {
        message: "The email has already been taken.".into(),
        errors: [("email".to_string(), vec!["The email has already been taken.".to_string()])]
            .into_iter()
            .collect(),
    });

    let err = controller.create(&create_form()).await.unwrap_err();

    assert_matches!(err, ActionError::Invalid(fields) if fields["email"].len() == 1);
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn successful_create_reloads_page() {
    let backend = ScriptedBackend::with_users(3);
    let controller = controller(&backend);
    controller.load(1, UserFilters::default()).await;

    controller.create(&create_form()).await.unwrap();

    assert_eq!(backend.created()[0]["username"], "newcomer");
    assert_eq!(backend.request_count(), 2);
    assert!(controller.stats().is_some());
}

#[tokio::test]
async fn server_errors_on_mutation_stay_api_errors() {
    let backend = ScriptedBackend::with_users(3);
    let controller = controller(&backend);
    backend.fail_next_mutation(ApiError::Status {
        status: 403,
        body: "Forbidden".into(),
    });

    let err = controller.delete(1).await.unwrap_err();

    assert_matches!(err, ActionError::Api(api) if api.status() == Some(403));
}

#[tokio::test]
async fn refresh_stats_records_counters() {
    let backend = ScriptedBackend::with_users(6);
    let controller = controller(&backend);

    controller.refresh_stats().await.unwrap();

    let stats = controller.stats().unwrap();
    assert_eq!(stats.total, 6);
    assert_eq!(stats.active, 3);
}

#[tokio::test]
async fn configured_page_size_is_sent() {
    let backend = ScriptedBackend::with_users(30);
    let controller = ListController::<Users>::new(
        backend.clone(),
        ControllerOptions {
            items_per_page: 10,
            ..Default::default()
        },
    );

    controller.load(1, UserFilters::default()).await;

    assert_eq!(backend.requests()[0].per_page, 10);
    assert_eq!(controller.pagination().total_pages, 3);
}

#[tokio::test]
async fn gated_response_can_be_scripted_directly() {
    let backend = ScriptedBackend::with_users(0);
    let controller = controller(&backend);
    let gate = backend.gate_next();
    gate.send(Ok(PageData {
        items: vec![user(7)],
        current_page: 1,
        last_page: 1,
        total: 1,
        per_page: 15,
    }))
    .unwrap();

    controller.load(1, UserFilters::default()).await;

    assert_eq!(ids(&controller.raw_items()), vec![7]);
}

#[tokio::test]
async fn failed_page_change_leaves_pagination_untouched() {
    let backend = ScriptedBackend::with_users(40);
    let controller = controller(&backend);
    controller.load(1, UserFilters::default()).await;
    let before = controller.pagination();

    backend.fail_next(503);
    let outcome = controller.update_pagination(PaginationUpdate::page(2)).await;

    assert_eq!(outcome, LoadOutcome::Failed);
    assert_eq!(controller.pagination(), before);
    assert_eq!(controller.raw_items()[0].id, 1);

    assert_eq!(controller.retry().await, LoadOutcome::Applied);
    assert_eq!(backend.requests().pop().unwrap().page, 2);
    assert_eq!(controller.pagination().current_page, 2);
    assert_eq!(controller.raw_items()[0].id, 16);
}

#[tokio::test]
async fn failed_load_past_the_end_keeps_page_in_range() {
    let backend = ScriptedBackend::with_users(40);
    let controller = controller(&backend);
    controller.load(1, UserFilters::default()).await;

    backend.fail_next(503);
    assert_eq!(controller.load(99, UserFilters::default()).await, LoadOutcome::Failed);

    let pagination = controller.pagination();
    assert_eq!(pagination.current_page, 1);
    assert!(pagination.current_page <= pagination.total_pages);
}

#[tokio::test]
async fn failed_page_size_change_keeps_committed_size() {
    let backend = ScriptedBackend::with_users(40);
    let controller = controller(&backend);
    controller.load(2, UserFilters::default()).await;

    backend.fail_next(500);
    controller.update_pagination(PaginationUpdate::per_page(25)).await;

    let pagination = controller.pagination();
    assert_eq!(pagination.items_per_page, 15);
    assert_eq!(pagination.current_page, 2);

    controller.retry().await;
    let last = backend.requests().pop().unwrap();
    assert_eq!((last.page, last.per_page), (1, 25));
    assert_eq!(controller.pagination().items_per_page, 25);
}

#[tokio::test(start_paused = true)]
async fn dropped_load_clears_loading() {
    let backend = ScriptedBackend::with_users(5);
    let controller = controller(&backend);
    let _gate = backend.gate_next();

    let result = tokio::time::timeout(
        Duration::from_millis(10),
        controller.load(1, UserFilters::default()),
    )
    .await;

    assert!(result.is_err());
    assert!(!controller.is_loading());
    assert!(controller.raw_items().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_an_older_load_keeps_newer_one_loading() {
    let backend = ScriptedBackend::with_users(40);
    let controller = controller(&backend);
    let _first_gate = backend.gate_next();
    let second_gate = backend.gate_next();

    let mut first = Box::pin(controller.load(1, UserFilters::default()));
    assert!(tokio::time::timeout(Duration::from_millis(10), &mut first).await.is_err());

    let second = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load(2, UserFilters::default()).await }
    });
    wait_for_requests(&backend, 2).await;

    drop(first);
    assert!(controller.is_loading());

    let request = backend.requests()[1].clone();
    second_gate.send(Ok(backend.serve(&request))).unwrap();
    assert_eq!(second.await.unwrap(), LoadOutcome::Applied);
    assert!(!controller.is_loading());
}
