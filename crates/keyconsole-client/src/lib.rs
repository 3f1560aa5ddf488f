//! HTTP client for the key-management backend
//!
//! Layers, bottom up: a [`Session`] holding the bearer token, an
//! [`HttpClient`] that attaches it and maps failures to [`ClientError`],
//! typed endpoint wrappers in [`api`], and cached query handles in
//! [`queries`] that invalidate on mutation.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api;
pub mod batch;
pub mod cache;
pub mod error;
pub mod http;
pub mod queries;
pub mod session;

pub use api::{ApiKeysApi, AuthApi, ItemsApi, UsersApi};
pub use batch::{BatchOutcome, BatchStatus};
pub use cache::{CacheEntry, EntryStatus, FetchTicket, QueryCache, QueryKey};
pub use error::{ClientError, ClientResult, NETWORK_ERROR_MESSAGE, NETWORK_ERROR_STATUS};
pub use http::{ApiRequest, Auth, HttpClient};
pub use queries::{ApiKeyQueries, ItemQueries, KeyConsoleClient, UserQueries};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
