//! Integration tests for the key-management view against a mock backend

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use common::*;
use keyconsole_client::ClientError;
use keyconsole_console::key_management::messages;
use keyconsole_console::{
    DeleteStrategy, HeaderCheckbox, MemoryClipboard, NotificationLevel, PageState,
};
use keyconsole_core::{PaginatedResult, PaginationInfo};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_refresh_fills_rows_and_pagination() {
    let console = TestConsole::start().await;
    let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let keys: Vec<_> = ids.iter().map(|id| key_json(*id, true)).collect();
    console.mount_keys(&keys, 23).await;

    let mut view = console.state.key_view();
    view.refresh().await;

    assert_eq!(view.page_ids(), ids);
    assert_eq!(view.pages().total(), 23);
    assert_eq!(view.pages().total_pages(), 3);
    assert!(view.pages().has_next());
    assert!(view.is_current());
    assert_eq!(view.header_checkbox(), HeaderCheckbox::Unchecked);

    view.select_all(true);
    assert_eq!(view.header_checkbox(), HeaderCheckbox::Checked);
    view.toggle_row(ids[0]);
    assert_eq!(view.header_checkbox(), HeaderCheckbox::Indeterminate);
    assert_eq!(view.selection().len(), 2);
}

#[tokio::test]
async fn test_superseded_load_is_discarded() {
    let console = TestConsole::start().await;
    let mut view = console.state.key_view();

    let old = view.begin_load();
    view.next_page();
    let latest = view.begin_load();
    assert!(latest.generation() > old.generation());

    let fresh_id = Uuid::new_v4();
    let fresh = PaginatedResult {
        data: vec![serde_json::from_value(key_json(fresh_id, true)).unwrap()],
        pagination: PaginationInfo::default(),
    };
    assert!(view.finish_load(latest, Ok(fresh)));

    let stale = PaginatedResult {
        data: vec![serde_json::from_value(key_json(Uuid::new_v4(), false)).unwrap()],
        pagination: PaginationInfo::default(),
    };
    assert!(!view.finish_load(old, Ok(stale)));
    assert_eq!(view.page_ids(), vec![fresh_id]);

    // a stale failure is dropped silently too
    let stale_again = view.begin_load();
    view.begin_load();
    assert!(!view.finish_load(stale_again, Err(ClientError::MissingToken)));
    assert!(console.state.notifications.entries().is_empty());
}

#[tokio::test]
async fn test_create_clamps_count_and_refreshes() {
    let console = TestConsole::start().await;
    console.mount_keys(&[], 0).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/api-keys/create"))
        .and(body_json(json!({"count": 100})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "count": 100})))
        .expect(1)
        .mount(&console.server)
        .await;

    let mut view = console.state.key_view();
    view.set_create_count(250);
    assert_eq!(view.create_count(), 100);
    view.set_create_count(0);
    assert_eq!(view.create_count(), 1);

    view.set_create_count(100);
    view.create().await;

    let note = console.state.notifications.last().unwrap();
    assert_eq!(note.level, NotificationLevel::Success);
    assert_eq!(note.title, "Created 100 keys");
    assert!(view.is_current());
}

#[tokio::test]
async fn test_server_detail_becomes_notification_text() {
    let console = TestConsole::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path(format!("/api/v1/api-keys/{id}")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&console.server)
        .await;

    let mut view = console.state.key_view();
    view.delete(id).await;

    let note = console.state.notifications.last().unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.title, messages::DELETE_FAILED);
    assert_eq!(note.description.as_deref(), Some("Token expired"));
}

#[tokio::test]
async fn test_batch_enable_skips_active_keys_and_keeps_failures_selected() {
    let console = TestConsole::start().await;
    let inactive_ok = Uuid::new_v4();
    let inactive_missing = Uuid::new_v4();
    let already_active = Uuid::new_v4();
    console
        .mount_keys(
            &[
                key_json(inactive_ok, false),
                key_json(inactive_missing, false),
                key_json(already_active, true),
            ],
            3,
        )
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/api-keys/{inactive_ok}/toggle")))
        .respond_with(ResponseTemplate::new(200).set_body_json(key_json(inactive_ok, true)))
        .expect(1)
        .mount(&console.server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/api-keys/{inactive_missing}/toggle")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "API key not found"})))
        .expect(1)
        .mount(&console.server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/api-keys/{already_active}/toggle")))
        .respond_with(ResponseTemplate::new(200).set_body_json(key_json(already_active, false)))
        .expect(0)
        .mount(&console.server)
        .await;

    let mut view = console.state.key_view();
    view.refresh().await;
    view.select_all(true);
    view.set_selected_active(true).await;

    let note = console.state.notifications.last().unwrap();
    assert_eq!(note.level, NotificationLevel::Warning);
    assert_eq!(note.title, "Enabled 1 of 2 keys");
    assert_eq!(note.description.as_deref(), Some("API key not found"));
    assert_eq!(view.selection().ids(), vec![inactive_missing]);
}

#[tokio::test]
async fn test_batch_delete_clears_selection() {
    let console = TestConsole::start().await;
    let ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
    let keys: Vec<_> = ids.iter().map(|id| key_json(*id, true)).collect();
    console.mount_keys(&keys, 2).await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/api-keys/batch"))
        .and(body_json(json!(ids)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": 2})))
        .expect(1)
        .mount(&console.server)
        .await;

    let mut view = console.state.key_view();
    view.refresh().await;
    view.select_all(true);
    view.delete_selected(DeleteStrategy::BatchEndpoint).await;

    assert!(!view.has_selection());
    assert_eq!(
        console.state.notifications.last().unwrap().title,
        "Deleted 2 keys"
    );
}

#[tokio::test]
async fn test_parallel_delete_all_fail() {
    let console = TestConsole::start().await;
    let ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&console.server)
        .await;

    let mut view = console.state.key_view();
    for id in &ids {
        view.toggle_row(*id);
    }
    view.delete_selected(DeleteStrategy::Parallel).await;

    let note = console.state.notifications.last().unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.title, messages::DELETE_FAILED);
    assert_eq!(note.description.as_deref(), Some("Failed to delete API key"));
    assert_eq!(view.selection().ids(), ids);
}

#[tokio::test]
async fn test_user_filter_is_admin_only() {
    let console = TestConsole::start().await;
    console.mount_me(false).await;
    console.mount_items().await;

    let mut view = console.state.key_view();
    view.load_context().await;

    assert!(!view.is_admin());
    assert!(view.users().is_empty());
    assert!(!view.set_user_filter(Some(Uuid::new_v4())));
    assert_eq!(view.list_params().user_id, None);
}

#[tokio::test]
async fn test_admin_filter_resets_page_and_is_sent() {
    let console = TestConsole::start().await;
    console.mount_me(true).await;
    console.mount_items().await;
    let owner = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user_json("a@b.io", false)])))
        .mount(&console.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/api-keys"))
        .and(query_param("userId", owner.to_string().as_str()))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[], 0)))
        .expect(1)
        .mount(&console.server)
        .await;

    let mut view = console.state.key_view();
    view.load_context().await;
    assert!(view.is_admin());
    assert_eq!(view.users().len(), 1);

    view.go_to_page(4);
    assert!(view.set_user_filter(Some(owner)));
    assert_eq!(view.pages().page(), 1);
    view.refresh().await;
    assert!(console.state.notifications.entries().is_empty());
}

#[tokio::test]
async fn test_copy_reports_clipboard_outcome() {
    let console = TestConsole::start().await;
    let id = Uuid::new_v4();
    console.mount_keys(&[key_json(id, true)], 1).await;

    let mut view = console.state.key_view();
    view.refresh().await;

    assert!(view.copy_key(id));
    assert_eq!(console.clipboard.contents(), Some(format!("sk-{}", id.simple())));
    assert_eq!(console.state.notifications.last().unwrap().title, messages::COPIED);

    let broken = TestConsole::with_clipboard(MemoryClipboard::failing()).await;
    let view = broken.state.key_view();
    assert!(!view.copy_text("sk-anything"));
    assert_eq!(
        broken.state.notifications.last().unwrap().title,
        "Copy failed, please copy manually"
    );
}

#[test]
fn test_page_state_defaults_follow_config() {
    let state = PageState::default();
    assert_eq!(state.page_size(), 10);
}

#[tokio::test]
async fn test_mutation_elsewhere_triggers_reload() {
    let console = TestConsole::start().await;
    let id = Uuid::new_v4();
    console.mount_keys(&[key_json(id, true)], 1).await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/api-keys/{id}/toggle")))
        .respond_with(ResponseTemplate::new(200).set_body_json(key_json(id, false)))
        .mount(&console.server)
        .await;

    let mut view = console.state.key_view();
    let mut invalidations = view.subscribe();
    view.refresh().await;
    let loads_before = view.begin_load().generation();

    console.state.client.keys().toggle(id).await.unwrap();

    let scope = invalidations.recv().await.unwrap();
    assert!(view.on_invalidated(&scope).await);
    assert!(view.is_current());
    assert!(view.begin_load().generation() > loads_before);
    assert!(!view.on_invalidated("users").await);
}

#[tokio::test]
async fn test_enable_off_page_key_already_active_toggles_back() {
    let console = TestConsole::start().await;
    let on_page = Uuid::new_v4();
    let off_page = Uuid::new_v4();
    console.mount_keys(&[key_json(on_page, false)], 1).await;

    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/api-keys/{off_page}/toggle")))
        .respond_with(FlippingKey::new(off_page, true))
        .expect(2)
        .mount(&console.server)
        .await;

    let mut view = console.state.key_view();
    view.refresh().await;
    view.toggle_row(off_page);
    view.set_selected_active(true).await;

    let note = console.state.notifications.last().unwrap();
    assert_eq!(note.level, NotificationLevel::Success);
    assert_eq!(note.title, "Enabled 1 keys");
    assert!(!view.has_selection());
}

#[tokio::test]
async fn test_enable_reports_key_stuck_in_wrong_state() {
    let console = TestConsole::start().await;
    let off_page = Uuid::new_v4();
    console.mount_keys(&[], 0).await;

    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/api-keys/{off_page}/toggle")))
        .respond_with(ResponseTemplate::new(200).set_body_json(key_json(off_page, false)))
        .expect(2)
        .mount(&console.server)
        .await;

    let mut view = console.state.key_view();
    view.refresh().await;
    view.toggle_row(off_page);
    view.set_selected_active(true).await;

    let note = console.state.notifications.last().unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.title, messages::OPERATION_FAILED);
    assert_eq!(note.description.as_deref(), Some(messages::STATE_NOT_REACHED));
    assert_eq!(view.selection().ids(), vec![off_page]);
}

#[tokio::test]
async fn test_single_delete_drops_id_from_selection_and_list() {
    let console = TestConsole::start().await;
    let deleted = Uuid::new_v4();
    let kept = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/api/v1/api-keys"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(&[key_json(deleted, true), key_json(kept, true)], 2)),
        )
        .up_to_n_times(1)
        .mount(&console.server)
        .await;
    console.mount_keys(&[key_json(kept, true)], 1).await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/v1/api-keys/{deleted}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&console.server)
        .await;

    let mut view = console.state.key_view();
    view.refresh().await;
    view.select_all(true);
    view.delete(deleted).await;

    assert_eq!(view.selection().ids(), vec![kept]);
    let ids: Vec<_> = view.keys().iter().map(|key| key.id).collect();
    assert_eq!(ids, vec![kept]);
    assert_eq!(
        console.state.notifications.last().unwrap().title,
        messages::DELETED
    );
}

#[tokio::test]
async fn test_toggle_twice_restores_state() {
    let console = TestConsole::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/api-keys/{id}/toggle")))
        .respond_with(FlippingKey::new(id, true))
        .expect(2)
        .mount(&console.server)
        .await;

    let keys = console.state.client.keys();
    let first = keys.toggle(id).await.unwrap();
    let second = keys.toggle(id).await.unwrap();

    assert!(!first.is_active);
    assert!(second.is_active);
}
