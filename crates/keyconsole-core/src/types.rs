//! Domain types exchanged with the key-management backend

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

/// Identifier of an API key
pub type KeyId = Uuid;

/// Opaque machine description reported by the device that bound a key
pub type MachineInfo = Map<String, Value>;

/// Largest batch the backend accepts for a single create call
pub const MAX_KEYS_PER_REQUEST: u32 = 100;

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Timestamp parsing that tolerates the backend's zone-less UTC values
pub mod timestamp {
    use super::{DateTime, Deserialize, Deserializer, NaiveDateTime, Utc};

    /// Parse an RFC 3339 timestamp, or a naive ISO-8601 one interpreted as UTC
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&Utc));
        }

        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
    }

    /// Serde adapter for required timestamps
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Serde adapter for nullable timestamps
    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Item reference embedded in a key record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    /// Item identifier
    pub id: Uuid,
    /// Item title
    pub title: String,
}

/// Server-issued API key as returned by the list, create and toggle endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Unique key identifier
    pub id: KeyId,

    /// Secret key value
    pub key: String,

    /// Whether the key is currently accepted by the platform
    pub is_active: bool,

    /// Creation timestamp
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,

    /// Owning user
    #[serde(default)]
    pub user_id: Option<Uuid>,

    /// Bound item identifier
    #[serde(default)]
    pub item_id: Option<Uuid>,

    /// Bound item, when the server expands it
    #[serde(default)]
    pub item: Option<ItemRef>,

    /// Device information, display-only
    #[serde(default, deserialize_with = "null_as_default")]
    pub machine_info: MachineInfo,

    /// Whether a device has bound this key
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_bound: bool,

    /// Expiry timestamp
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Last successful verification by a device
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub last_verified_at: Option<DateTime<Utc>>,
}

/// Selectable binding target for new keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier
    pub id: Uuid,
    /// Item title
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Owning user
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

/// Platform user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: Uuid,
    /// Login email
    pub email: String,
    /// Optional user name
    #[serde(default)]
    pub username: Option<String>,
    /// Optional full name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Whether the account is enabled
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Administrator flag, gates admin-only UI
    #[serde(default)]
    pub is_superuser: bool,
}

const fn default_true() -> bool {
    true
}

impl User {
    /// Name shown in selectors: the email, or the user name when the email is blank
    pub fn display_name(&self) -> &str {
        if self.email.trim().is_empty() {
            self.username.as_deref().unwrap_or(&self.email)
        } else {
            &self.email
        }
    }
}

/// Pagination summary reported by the server for a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    /// Total number of matching records
    pub total: u64,
    /// Total number of pages at the requested page size
    pub total_pages: u32,
}

impl Default for PaginationInfo {
    fn default() -> Self {
        Self {
            total: 0,
            total_pages: 1,
        }
    }
}

impl PaginationInfo {
    /// Derive pagination from a bare record count; there is always at least one page
    pub fn from_count(total: u64, page_size: u32) -> Self {
        let page_size = u64::from(page_size.max(1));
        let pages = total.div_ceil(page_size).max(1);

        Self {
            total,
            total_pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    /// Records on this page, in server order
    pub data: Vec<T>,
    /// Pagination summary
    pub pagination: PaginationInfo,
}

impl<T> Default for PaginatedResult<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            pagination: PaginationInfo::default(),
        }
    }
}

/// Query parameters of the key list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListKeysParams {
    /// Page number (1-based)
    pub page: u32,
    /// Rows per page
    pub page_size: u32,
    /// Restrict to keys owned by this user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl Default for ListKeysParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            user_id: None,
        }
    }
}

impl ListKeysParams {
    /// Offset of the first row of this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Query string pairs, including the offset form understood by older servers
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(user_id) = self.user_id {
            pairs.push(("userId", user_id.to_string()));
        }
        pairs.push(("skip", self.offset().to_string()));
        pairs.push(("limit", self.page_size.to_string()));
        pairs
    }
}

/// Batch creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateKeysRequest {
    /// Number of keys to create
    #[validate(range(min = 1, max = 100, message = "count must be between 1 and 100"))]
    pub count: u32,

    /// Item to bind the new keys to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
}

impl CreateKeysRequest {
    /// Create an unbound request
    pub const fn new(count: u32) -> Self {
        Self {
            count,
            item_id: None,
        }
    }

    /// Bind the new keys to an item
    #[must_use]
    pub const fn with_item(mut self, item_id: Option<Uuid>) -> Self {
        self.item_id = item_id;
        self
    }

    /// Check the request before sending it
    pub fn check(&self) -> crate::Result<()> {
        self.validate().map_err(|errors| {
            let message = errors
                .field_errors()
                .into_iter()
                .flat_map(|(_, errs)| errs.iter())
                .filter_map(|err| err.message.as_ref().map(ToString::to_string))
                .next()
                .unwrap_or_else(|| "invalid value".to_string());
            crate::Error::invalid_field("count", message)
        })
    }
}

/// Self-registration payload
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
    /// Invite code validated by the server
    pub invite_code: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("invite_code", &self.invite_code)
            .finish()
    }
}

/// Bearer token issued by the login endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Token value
    pub access_token: String,
    /// Token type, normally `bearer`
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}
