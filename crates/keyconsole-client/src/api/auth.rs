//! Registration and login

use super::parse;
use crate::error::{ClientError, ClientResult};
use crate::http::{ApiRequest, Auth, HttpClient};
use keyconsole_core::{AccessToken, RegisterRequest};
use serde_json::Value;
use tracing::info;

/// Message shown when a registration fails without a server `detail`
pub const REGISTRATION_FAILED: &str =
    "Registration failed, please check that the invite code is valid";

/// Calls that create or end a session
#[derive(Debug, Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    /// Create the endpoint wrapper
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Create an account; never sends a bearer token
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<Value> {
        let body = serde_json::to_value(request)
            .map_err(|e| ClientError::invalid_request(e.to_string()))?;
        let created = self
            .http
            .send(
                ApiRequest::post("/auth/register")
                    .unprefixed()
                    .json(body)
                    .auth(Auth::Anonymous)
                    .fallback(REGISTRATION_FAILED),
            )
            .await?;
        info!(email = %request.email, "registered account");
        Ok(created)
    }

    /// Exchange credentials for a token and store it in the session
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<AccessToken> {
        let body = self
            .http
            .send(
                ApiRequest::post("/login/access-token")
                    .form(vec![
                        ("username".to_string(), username.to_string()),
                        ("password".to_string(), password.to_string()),
                    ])
                    .auth(Auth::Anonymous)
                    .fallback("Login failed"),
            )
            .await?;
        let token: AccessToken = parse(body)?;

        self.http.session().login(&token.access_token)?;
        info!(username, "logged in");
        Ok(token)
    }

    /// Forget the stored token
    pub fn logout(&self) -> ClientResult<()> {
        self.http.session().logout()?;
        info!("logged out");
        Ok(())
    }
}
