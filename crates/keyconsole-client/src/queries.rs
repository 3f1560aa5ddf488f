//! Cached reads and invalidating writes
//!
//! Reads go through the [`QueryCache`]; a successful mutation invalidates
//! the scope it touched so the next read refetches.

use crate::api::{ApiKeysApi, AuthApi, ItemsApi, UsersApi, parse, parse_list, parse_page};
use crate::batch::BatchOutcome;
use crate::cache::{QueryCache, QueryKey};
use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::session::Session;
use futures::future::join_all;
use keyconsole_core::{
    AccessToken, ApiKey, Config, CreateKeysRequest, Item, KeyId, ListKeysParams, PaginatedResult,
    RegisterRequest, User,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache scope names
pub mod scope {
    /// Paginated key listings
    pub const API_KEYS: &str = "api-keys";
    /// User list
    pub const USERS: &str = "users";
    /// Logged-in user
    pub const CURRENT_USER: &str = "current-user";
    /// Item list
    pub const ITEMS: &str = "items";
}

/// Key listing and key mutations
#[derive(Debug, Clone)]
pub struct ApiKeyQueries {
    api: ApiKeysApi,
    cache: Arc<QueryCache>,
}

impl ApiKeyQueries {
    /// Wrap the endpoint calls with `cache`
    pub const fn new(api: ApiKeysApi, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    /// One page of keys, served from cache while fresh
    pub async fn list(&self, params: &ListKeysParams) -> ClientResult<PaginatedResult<ApiKey>> {
        let key = QueryKey::new(scope::API_KEYS, params);
        let body = self.cache.query(key, || self.api.list_raw(params)).await?;
        parse_page(body, params.page_size)
    }

    /// Create keys
    pub async fn create(&self, request: &CreateKeysRequest) -> ClientResult<PaginatedResult<ApiKey>> {
        let created = self.api.create(request).await?;
        self.cache.invalidate(scope::API_KEYS);
        Ok(created)
    }

    /// Delete one key
    pub async fn delete(&self, id: KeyId) -> ClientResult<()> {
        self.api.delete(id).await?;
        self.cache.invalidate(scope::API_KEYS);
        Ok(())
    }

    /// Delete several keys through the batch endpoint
    pub async fn delete_batch(&self, ids: &[KeyId]) -> ClientResult<Value> {
        let summary = self.api.delete_batch(ids).await?;
        self.cache.invalidate(scope::API_KEYS);
        Ok(summary)
    }

    /// Toggle one key
    pub async fn toggle(&self, id: KeyId) -> ClientResult<ApiKey> {
        let key = self.api.toggle(id).await?;
        self.cache.invalidate(scope::API_KEYS);
        Ok(key)
    }

    /// Delete each key with its own request, all in flight at once
    pub async fn delete_each(&self, ids: &[KeyId]) -> BatchOutcome<()> {
        let results = join_all(ids.iter().map(|&id| async move { (id, self.api.delete(id).await) })).await;
        self.finish_batch("delete", results.into_iter().collect())
    }

    /// Toggle each key with its own request, all in flight at once
    pub async fn toggle_each(&self, ids: &[KeyId]) -> BatchOutcome<ApiKey> {
        let results = join_all(ids.iter().map(|&id| async move { (id, self.api.toggle(id).await) })).await;
        self.finish_batch("toggle", results.into_iter().collect())
    }

    fn finish_batch<T>(&self, action: &str, outcome: BatchOutcome<T>) -> BatchOutcome<T> {
        if outcome.any_succeeded() {
            self.cache.invalidate(scope::API_KEYS);
        }
        if outcome.failed.is_empty() {
            debug!(action, count = outcome.len(), "batch completed");
        } else {
            warn!(
                action,
                succeeded = outcome.succeeded.len(),
                failed = outcome.failed.len(),
                "batch completed with failures"
            );
        }
        outcome
    }
}

/// User reads
#[derive(Debug, Clone)]
pub struct UserQueries {
    api: UsersApi,
    cache: Arc<QueryCache>,
}

impl UserQueries {
    /// Wrap the endpoint calls with `cache`
    pub const fn new(api: UsersApi, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    /// All users
    pub async fn list(&self) -> ClientResult<Vec<User>> {
        let body = self
            .cache
            .query(QueryKey::scope_only(scope::USERS), || self.api.list_raw())
            .await?;
        parse_list(body)
    }

    /// Logged-in user
    pub async fn me(&self) -> ClientResult<User> {
        let body = self
            .cache
            .query(QueryKey::scope_only(scope::CURRENT_USER), || self.api.me_raw())
            .await?;
        parse(body)
    }
}

/// Item reads
#[derive(Debug, Clone)]
pub struct ItemQueries {
    api: ItemsApi,
    cache: Arc<QueryCache>,
}

impl ItemQueries {
    /// Wrap the endpoint calls with `cache`
    pub const fn new(api: ItemsApi, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    /// All items
    pub async fn list(&self) -> ClientResult<Vec<Item>> {
        let body = self
            .cache
            .query(QueryKey::scope_only(scope::ITEMS), || self.api.list_raw())
            .await?;
        parse_list(body)
    }
}

/// Everything the console needs to talk to the backend, sharing one
/// session and one cache
#[derive(Debug, Clone)]
pub struct KeyConsoleClient {
    http: HttpClient,
    cache: Arc<QueryCache>,
    keys: ApiKeyQueries,
    users: UserQueries,
    items: ItemQueries,
    auth: AuthApi,
}

impl KeyConsoleClient {
    /// Client over an existing session
    pub fn new(http: HttpClient) -> Self {
        let cache = Arc::new(QueryCache::new());
        Self {
            keys: ApiKeyQueries::new(ApiKeysApi::new(http.clone()), Arc::clone(&cache)),
            users: UserQueries::new(UsersApi::new(http.clone()), Arc::clone(&cache)),
            items: ItemQueries::new(ItemsApi::new(http.clone()), Arc::clone(&cache)),
            auth: AuthApi::new(http.clone()),
            http,
            cache,
        }
    }

    /// Client built from configuration
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let session = Session::from_config(&config.session)?;
        let http = HttpClient::new(config.api.clone(), session)?;
        Ok(Self::new(http))
    }

    /// Key operations
    pub const fn keys(&self) -> &ApiKeyQueries {
        &self.keys
    }

    /// User reads
    pub const fn users(&self) -> &UserQueries {
        &self.users
    }

    /// Item reads
    pub const fn items(&self) -> &ItemQueries {
        &self.items
    }

    /// Shared cache
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Session the client authenticates with
    pub const fn session(&self) -> &Session {
        self.http.session()
    }

    /// Create an account
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<Value> {
        self.auth.register(request).await
    }

    /// Log in and drop anything cached for a previous user
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<AccessToken> {
        let token = self.auth.login(username, password).await?;
        self.cache.clear();
        Ok(token)
    }

    /// Log out and drop the cache
    pub fn logout(&self) -> ClientResult<()> {
        self.auth.logout()?;
        self.cache.clear();
        Ok(())
    }
}
