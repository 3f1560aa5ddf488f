//! Item endpoints; items are only binding targets for new keys

use super::parse_list;
use crate::error::ClientResult;
use crate::http::{ApiRequest, HttpClient};
use keyconsole_core::Item;
use serde_json::Value;

/// Calls against `/items`
#[derive(Debug, Clone)]
pub struct ItemsApi {
    http: HttpClient,
}

impl ItemsApi {
    /// Create the endpoint wrapper
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// All items visible to the user, as the raw response body
    pub async fn list_raw(&self) -> ClientResult<Value> {
        self.http
            .send(ApiRequest::get("/items").fallback("Failed to fetch items"))
            .await
    }

    /// All items visible to the user
    pub async fn list(&self) -> ClientResult<Vec<Item>> {
        parse_list(self.list_raw().await?)
    }
}
