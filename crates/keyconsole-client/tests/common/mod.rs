//! Shared fixtures for the client integration tests

#![allow(dead_code, clippy::unwrap_used)]

use keyconsole_client::{HttpClient, KeyConsoleClient, Session};
use keyconsole_core::{ApiConfig, KeyId};
use serde_json::{Value, json};
use uuid::Uuid;
use wiremock::MockServer;

/// Token stored by [`TestBackend::logged_in`]
pub const TEST_TOKEN: &str = "test-token-123";

/// A mock backend plus a client pointed at it
pub struct TestBackend {
    pub server: MockServer,
    pub session: Session,
    pub client: KeyConsoleClient,
}

impl TestBackend {
    /// Backend with no stored token
    pub async fn anonymous() -> Self {
        let server = MockServer::start().await;
        let session = Session::in_memory();
        let client = client_for(&server.uri(), session.clone());
        Self {
            server,
            session,
            client,
        }
    }

    /// Backend with [`TEST_TOKEN`] stored
    pub async fn logged_in() -> Self {
        let backend = Self::anonymous().await;
        backend.session.login(TEST_TOKEN).unwrap();
        backend
    }

    /// Request paths received so far, in order
    pub async fn received_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }
}

/// Client for `base_url` using `session`
pub fn client_for(base_url: &str, session: Session) -> KeyConsoleClient {
    let api = ApiConfig {
        base_url: base_url.to_string(),
        request_timeout: 5,
        ..ApiConfig::default()
    };
    KeyConsoleClient::new(HttpClient::new(api, session).unwrap())
}

/// Key record as the backend serializes it
pub fn key_json(id: KeyId, is_active: bool) -> Value {
    json!({
        "id": id,
        "key": format!("sk-{}", id.simple()),
        "is_active": is_active,
        "created_at": "2024-05-01T12:30:00",
        "user_id": Uuid::nil(),
        "item_id": null,
        "item": null,
        "machine_info": {},
        "is_bound": false,
        "expires_at": null,
        "last_verified_at": null
    })
}

/// User record as the backend serializes it
pub fn user_json(email: &str, is_superuser: bool) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "email": email,
        "username": null,
        "full_name": null,
        "is_active": true,
        "is_superuser": is_superuser
    })
}
