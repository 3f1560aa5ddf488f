//! Keyed query cache with scope-wide invalidation
//!
//! Results are stored per `(scope, parameters)` pair so that every
//! filter/page combination is cached on its own. Invalidating a scope marks
//! all of its entries stale and notifies subscribers; the next read refetches.
//!
//! Each fetch carries a [`FetchTicket`] recording the scope epoch it started
//! in. A response that lands after an invalidation of its scope is stored as
//! stale, so data read before a mutation is never served as fresh. A
//! response that lands after [`QueryCache::clear`] is dropped.

use crate::error::ClientResult;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::future::Future;
use tokio::sync::broadcast;
use tracing::debug;

const SUBSCRIBER_CAPACITY: usize = 64;

/// Cache key: operation scope plus canonical parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    scope: String,
    params: String,
}

impl QueryKey {
    /// Key for `scope` with serialized `params`
    pub fn new<P: Serialize + ?Sized>(scope: &str, params: &P) -> Self {
        Self {
            scope: scope.to_string(),
            params: serde_json::to_string(params).unwrap_or_default(),
        }
    }

    /// Key for a parameterless query
    pub fn scope_only(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            params: String::new(),
        }
    }

    /// Scope the key belongs to
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Serialized parameters
    pub fn params(&self) -> &str {
        &self.params
    }
}

/// Freshness of a cached entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Usable as-is
    Fresh,
    /// Must be refetched before use
    Stale,
}

/// Cached response
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Response body as returned by the server
    pub data: Value,
    /// When the response was stored
    pub fetched_at: DateTime<Utc>,
    /// Freshness
    pub status: EntryStatus,
}

/// Proof that a fetch started at a given scope epoch
#[derive(Debug, Clone)]
pub struct FetchTicket {
    key: QueryKey,
    epoch: u64,
    clears: u64,
}

impl FetchTicket {
    /// Key being fetched
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }
}

/// Shared query cache
#[derive(Debug)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    epochs: RwLock<HashMap<String, u64>>,
    clears: AtomicU64,
    invalidations: broadcast::Sender<String>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            epochs: RwLock::new(HashMap::new()),
            clears: AtomicU64::new(0),
            invalidations,
        }
    }

    fn epoch(&self, scope: &str) -> u64 {
        self.epochs.read().get(scope).copied().unwrap_or(0)
    }

    /// Cached entry for `key`, fresh or not
    pub fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    /// Cached data for `key` when it is still fresh
    pub fn fresh(&self, key: &QueryKey) -> Option<Value> {
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.status == EntryStatus::Fresh)
            .map(|entry| entry.data.clone())
    }

    /// Register the start of a fetch for `key`
    pub fn begin_fetch(&self, key: QueryKey) -> FetchTicket {
        let epoch = self.epoch(key.scope());
        let clears = self.clears.load(Ordering::Acquire);
        FetchTicket { key, epoch, clears }
    }

    /// Store the result of a fetch; returns the status it was stored with
    ///
    /// Results of fetches started before the last [`clear`](Self::clear) are
    /// not stored and report [`EntryStatus::Stale`].
    pub fn complete(&self, ticket: FetchTicket, data: Value) -> EntryStatus {
        let mut entries = self.entries.write();
        if self.clears.load(Ordering::Acquire) != ticket.clears {
            debug!(scope = ticket.key.scope(), "fetch finished after cache was cleared");
            return EntryStatus::Stale;
        }

        let status = if self.epoch(ticket.key.scope()) == ticket.epoch {
            EntryStatus::Fresh
        } else {
            debug!(scope = ticket.key.scope(), "fetch finished after invalidation");
            EntryStatus::Stale
        };

        entries.insert(
            ticket.key,
            CacheEntry {
                data,
                fetched_at: Utc::now(),
                status,
            },
        );
        status
    }

    /// Mark every entry under `scope` stale and notify subscribers
    pub fn invalidate(&self, scope: &str) -> usize {
        *self.epochs.write().entry(scope.to_string()).or_insert(0) += 1;

        let mut marked = 0;
        for (key, entry) in self.entries.write().iter_mut() {
            if key.scope() == scope {
                entry.status = EntryStatus::Stale;
                marked += 1;
            }
        }

        // no subscribers is fine
        let _ = self.invalidations.send(scope.to_string());
        debug!(scope, marked, "invalidated cache scope");
        marked
    }

    /// Receive the names of invalidated scopes
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.invalidations.subscribe()
    }

    /// Serve a fresh entry or run `fetch` and store its result
    pub async fn query<F, Fut>(&self, key: QueryKey, fetch: F) -> ClientResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<Value>>,
    {
        if let Some(data) = self.fresh(&key) {
            debug!(scope = key.scope(), "cache hit");
            return Ok(data);
        }

        let ticket = self.begin_fetch(key);
        let data = fetch().await?;
        self.complete(ticket, data.clone());
        Ok(data)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry, e.g. on logout; fetches still in flight are discarded
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        self.clears.fetch_add(1, Ordering::AcqRel);
    }
}
