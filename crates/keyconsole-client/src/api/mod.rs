//! Typed wrappers around the backend endpoints

pub mod auth;
pub mod items;
pub mod keys;
pub mod users;

pub use auth::AuthApi;
pub use items::ItemsApi;
pub use keys::ApiKeysApi;
pub use users::UsersApi;

use crate::error::{ClientError, ClientResult, NETWORK_ERROR_MESSAGE};
use keyconsole_core::{PaginatedResult, PaginationInfo};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// List responses come either bare or wrapped in an envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Bare(Vec<T>),
    Envelope {
        data: Vec<T>,
        #[serde(default)]
        pagination: Option<PaginationInfo>,
        #[serde(default)]
        count: Option<u64>,
    },
}

impl<T> ListPayload<T> {
    fn into_page(self, page_size: u32) -> PaginatedResult<T> {
        match self {
            Self::Envelope {
                data,
                pagination,
                count,
            } => {
                let pagination = pagination.unwrap_or_else(|| {
                    PaginationInfo::from_count(count.unwrap_or(data.len() as u64), page_size)
                });
                PaginatedResult { data, pagination }
            }
            Self::Bare(data) => {
                let pagination = PaginationInfo::from_count(data.len() as u64, page_size);
                PaginatedResult { data, pagination }
            }
        }
    }

    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Envelope { data, .. } | Self::Bare(data) => data,
        }
    }
}

/// Decode a response body into `T`; a mismatch counts as a network failure
pub(crate) fn parse<T: DeserializeOwned>(value: Value) -> ClientResult<T> {
    serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "unexpected response shape");
        ClientError::network(NETWORK_ERROR_MESSAGE)
    })
}

/// Decode a paginated list
pub(crate) fn parse_page<T: DeserializeOwned>(
    value: Value,
    page_size: u32,
) -> ClientResult<PaginatedResult<T>> {
    parse::<ListPayload<T>>(value).map(|payload| payload.into_page(page_size))
}

/// Decode a list that may or may not be enveloped
pub(crate) fn parse_list<T: DeserializeOwned>(value: Value) -> ClientResult<Vec<T>> {
    parse::<ListPayload<T>>(value).map(ListPayload::into_vec)
}
