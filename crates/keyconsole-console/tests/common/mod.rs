//! Shared fixtures for the console integration tests

#![allow(dead_code, clippy::unwrap_used)]

use keyconsole_client::{HttpClient, KeyConsoleClient, Session};
use keyconsole_console::{Clipboard, ConsoleState, MemoryClipboard};
use keyconsole_core::{ApiConfig, Config, KeyId};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Mock backend plus console state pointed at it
pub struct TestConsole {
    pub server: MockServer,
    pub state: ConsoleState,
    pub clipboard: Arc<MemoryClipboard>,
}

impl TestConsole {
    /// Console with a stored token and a working clipboard
    pub async fn start() -> Self {
        Self::with_clipboard(MemoryClipboard::new()).await
    }

    /// Console with a stored token and the given clipboard
    pub async fn with_clipboard(clipboard: MemoryClipboard) -> Self {
        let server = MockServer::start().await;
        let session = Session::in_memory();
        session.login("console-token").unwrap();

        let mut config = Config::default();
        config.api = ApiConfig {
            base_url: server.uri(),
            request_timeout: 5,
            ..ApiConfig::default()
        };
        let client = KeyConsoleClient::new(HttpClient::new(config.api.clone(), session).unwrap());

        let clipboard = Arc::new(clipboard);
        let shared: Arc<dyn Clipboard> = clipboard.clone();
        let state = ConsoleState::with_parts(config, client, shared);
        Self {
            server,
            state,
            clipboard,
        }
    }

    /// Answer `/users/me` with a user of the given role
    pub async fn mount_me(&self, is_superuser: bool) {
        Mock::given(method("GET"))
            .and(path("/api/v1/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("me@example.com", is_superuser)))
            .mount(&self.server)
            .await;
    }

    /// Answer `/items` with an empty list
    pub async fn mount_items(&self) {
        Mock::given(method("GET"))
            .and(path("/api/v1/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&self.server)
            .await;
    }

    /// Answer every key listing with `keys`
    pub async fn mount_keys(&self, keys: &[Value], total: u64) {
        Mock::given(method("GET"))
            .and(path("/api/v1/api-keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(keys, total)))
            .mount(&self.server)
            .await;
    }
}

/// Key record as the backend serializes it
pub fn key_json(id: KeyId, is_active: bool) -> Value {
    json!({
        "id": id,
        "key": format!("sk-{}", id.simple()),
        "is_active": is_active,
        "created_at": "2024-05-01T12:30:00",
        "user_id": null,
        "item": null,
        "machine_info": null
    })
}

/// Paginated list body
pub fn page_json(keys: &[Value], total: u64) -> Value {
    json!({
        "data": keys,
        "pagination": {"total": total, "total_pages": total.div_ceil(10).max(1)}
    })
}

/// User record as the backend serializes it
pub fn user_json(email: &str, is_superuser: bool) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "email": email,
        "is_superuser": is_superuser
    })
}

/// Toggle endpoint for one key that flips a stored flag on every call
pub struct FlippingKey {
    id: KeyId,
    active: AtomicBool,
}

impl FlippingKey {
    pub fn new(id: KeyId, active: bool) -> Self {
        Self {
            id,
            active: AtomicBool::new(active),
        }
    }
}

impl Respond for FlippingKey {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let now_active = !self.active.fetch_xor(true, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(key_json(self.id, now_active))
    }
}
