//! Authenticated JSON transport

use crate::error::{ClientError, ClientResult, NETWORK_ERROR_MESSAGE};
use crate::session::Session;
use keyconsole_core::ApiConfig;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Fallback message used when a failed response carries no `detail`
pub const DEFAULT_ERROR_MESSAGE: &str = "Request failed";

/// How a request is authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// A stored token is a precondition; the call fails without one
    Required,
    /// Attach the token when one is stored
    IfPresent,
    /// Never attach a token
    Anonymous,
}

#[derive(Debug, Clone)]
enum Body {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A single backend call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    prefixed: bool,
    query: Vec<(&'static str, String)>,
    body: Option<Body>,
    auth: Auth,
    fallback: String,
}

impl ApiRequest {
    /// Request to `path` under the versioned API prefix
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            prefixed: true,
            query: Vec::new(),
            body: None,
            auth: Auth::IfPresent,
            fallback: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }

    /// GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Address `path` relative to the bare base URL instead of the API prefix
    #[must_use]
    pub fn unprefixed(mut self) -> Self {
        self.prefixed = false;
        self
    }

    /// Append query parameters
    #[must_use]
    pub fn query(mut self, pairs: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Send a JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    /// Send a form-encoded body
    #[must_use]
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(Body::Form(fields));
        self
    }

    /// Set the authentication mode
    #[must_use]
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Message reported when the server gives no `detail`
    #[must_use]
    pub fn fallback(mut self, message: impl Into<String>) -> Self {
        self.fallback = message.into();
        self
    }

    /// HTTP method
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path as given
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// HTTP client attaching the session's bearer token to backend calls
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    api: ApiConfig,
    session: Session,
}

impl HttpClient {
    /// Create a client for the configured backend
    pub fn new(api: ApiConfig, session: Session) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.request_timeout))
            .user_agent(concat!("keyconsole/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api,
            session,
        })
    }

    /// Session the client reads its token from
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Backend configuration
    pub const fn api_config(&self) -> &ApiConfig {
        &self.api
    }

    fn url_for(&self, request: &ApiRequest) -> String {
        if request.prefixed {
            self.api.api_url(&request.path)
        } else {
            format!("{}{}", self.api.base_url.trim_end_matches('/'), request.path)
        }
    }

    /// Send a request and decode the JSON response
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let body = self.execute(request).await?;
        decode(&body)
    }

    /// Send a request whose response body is irrelevant
    pub async fn send_unit(&self, request: ApiRequest) -> ClientResult<()> {
        self.execute(request).await.map(|_| ())
    }

    async fn execute(&self, request: ApiRequest) -> ClientResult<Vec<u8>> {
        // read on every call, never cached
        let token = match request.auth {
            Auth::Required => Some(self.session.require_token()?),
            Auth::IfPresent => self.session.token()?,
            Auth::Anonymous => None,
        };

        let url = self.url_for(&request);
        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            Some(Body::Json(body)) => builder.json(body),
            Some(Body::Form(fields)) => builder.form(fields),
            None => builder.header(CONTENT_TYPE, "application/json"),
        };

        debug!(method = %request.method, %url, "sending request");

        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, %url, error = %e, "request did not complete");
            ClientError::network(NETWORK_ERROR_MESSAGE)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(%url, error = %e, "failed to read response body");
            ClientError::network(NETWORK_ERROR_MESSAGE)
        })?;

        if !status.is_success() {
            let message = error_message(&body, &request.fallback);
            warn!(method = %request.method, %url, status = status.as_u16(), %message, "request rejected");
            return Err(ClientError::http(status.as_u16(), message));
        }

        debug!(method = %request.method, %url, status = status.as_u16(), "request succeeded");
        Ok(body.to_vec())
    }
}

/// Decode a success body; an empty body decodes as JSON `null`
fn decode<T: DeserializeOwned>(body: &[u8]) -> ClientResult<T> {
    let result = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(body)
    };

    result.map_err(|e| {
        warn!(error = %e, "failed to decode response body");
        ClientError::network(NETWORK_ERROR_MESSAGE)
    })
}

/// Extract the user-facing message from an error body
///
/// A string `detail` is used verbatim. A list of validation entries is
/// joined by their `msg` fields. Anything else yields `fallback`.
pub fn error_message(body: &[u8], fallback: &str) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return fallback.to_string();
    };

    match value.get("detail") {
        Some(Value::String(detail)) if !detail.trim().is_empty() => detail.clone(),
        Some(Value::Array(entries)) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                fallback.to_string()
            } else {
                messages.join("; ")
            }
        }
        _ => fallback.to_string(),
    }
}
