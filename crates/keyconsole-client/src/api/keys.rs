//! API-key endpoints

use super::{parse, parse_page};
use crate::error::{ClientError, ClientResult};
use crate::http::{ApiRequest, Auth, HttpClient};
use keyconsole_core::{ApiKey, CreateKeysRequest, KeyId, ListKeysParams, PaginatedResult};
use serde_json::Value;
use tracing::info;

const KEYS_PATH: &str = "/api-keys";

/// Calls against `/api-keys`
#[derive(Debug, Clone)]
pub struct ApiKeysApi {
    http: HttpClient,
}

impl ApiKeysApi {
    /// Create the endpoint wrapper
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Fetch one page of keys as the raw response body
    pub async fn list_raw(&self, params: &ListKeysParams) -> ClientResult<Value> {
        self.http
            .send(
                ApiRequest::get(KEYS_PATH)
                    .query(params.query_pairs())
                    .fallback("Failed to fetch API keys"),
            )
            .await
    }

    /// Fetch one page of keys
    pub async fn list(&self, params: &ListKeysParams) -> ClientResult<PaginatedResult<ApiKey>> {
        let body = self.list_raw(params).await?;
        parse_page(body, params.page_size)
    }

    /// Create `request.count` keys, optionally bound to an item
    pub async fn create(&self, request: &CreateKeysRequest) -> ClientResult<PaginatedResult<ApiKey>> {
        request.check()?;

        let body = serde_json::to_value(request)
            .map_err(|e| ClientError::invalid_request(e.to_string()))?;
        let created = self
            .http
            .send(
                ApiRequest::post(format!("{KEYS_PATH}/create"))
                    .json(body)
                    .auth(Auth::Required)
                    .fallback("Failed to create API keys"),
            )
            .await?;

        let page = parse_page(created, request.count)?;
        info!(count = page.data.len(), item_id = ?request.item_id, "created API keys");
        Ok(page)
    }

    /// Delete a single key
    pub async fn delete(&self, id: KeyId) -> ClientResult<()> {
        self.http
            .send_unit(
                ApiRequest::delete(format!("{KEYS_PATH}/{id}"))
                    .auth(Auth::Required)
                    .fallback("Failed to delete API key"),
            )
            .await?;
        info!(%id, "deleted API key");
        Ok(())
    }

    /// Delete several keys in one request; returns the server's summary
    pub async fn delete_batch(&self, ids: &[KeyId]) -> ClientResult<Value> {
        if ids.is_empty() {
            return Err(ClientError::invalid_request("no keys selected"));
        }

        let body = serde_json::to_value(ids)
            .map_err(|e| ClientError::invalid_request(e.to_string()))?;
        let summary = self
            .http
            .send(
                ApiRequest::delete(format!("{KEYS_PATH}/batch"))
                    .json(body)
                    .auth(Auth::Required)
                    .fallback("Failed to delete API keys"),
            )
            .await?;
        info!(count = ids.len(), "batch-deleted API keys");
        Ok(summary)
    }

    /// Flip the active flag of a key and return the updated record
    pub async fn toggle(&self, id: KeyId) -> ClientResult<ApiKey> {
        let body = self
            .http
            .send(
                ApiRequest::put(format!("{KEYS_PATH}/{id}/toggle"))
                    .auth(Auth::Required)
                    .fallback("Failed to toggle API key"),
            )
            .await?;
        let key: ApiKey = parse(body)?;
        info!(%id, is_active = key.is_active, "toggled API key");
        Ok(key)
    }
}
