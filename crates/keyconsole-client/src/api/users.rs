//! User endpoints, read-only

use super::{parse, parse_list};
use crate::error::ClientResult;
use crate::http::{ApiRequest, Auth, HttpClient};
use keyconsole_core::User;
use serde_json::Value;

/// Calls against `/users`
#[derive(Debug, Clone)]
pub struct UsersApi {
    http: HttpClient,
}

impl UsersApi {
    /// Create the endpoint wrapper
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// All users, as the raw response body
    pub async fn list_raw(&self) -> ClientResult<Value> {
        self.http
            .send(ApiRequest::get("/users").fallback("Failed to fetch users"))
            .await
    }

    /// All users
    pub async fn list(&self) -> ClientResult<Vec<User>> {
        parse_list(self.list_raw().await?)
    }

    /// The logged-in user, as the raw response body
    pub async fn me_raw(&self) -> ClientResult<Value> {
        self.http
            .send(
                ApiRequest::get("/users/me")
                    .auth(Auth::Required)
                    .fallback("Failed to fetch current user"),
            )
            .await
    }

    /// The logged-in user
    pub async fn me(&self) -> ClientResult<User> {
        parse(self.me_raw().await?)
    }
}
