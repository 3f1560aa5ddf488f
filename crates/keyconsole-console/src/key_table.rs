//! Display rows for the key table

use keyconsole_core::{ApiKey, MachineInfo};
use serde_json::Value;
use std::fmt::Write as _;

/// Shown when no device has reported machine info for a key
pub const NO_DEVICE: &str = "No device bound";
/// Shown when a key is not bound to an item
pub const NO_PROJECT: &str = "No project";
/// Shown when a key has no owner
pub const NO_USER: &str = "No user";

/// Column headers, in display order
pub const COLUMNS: [&str; 7] = ["", "Key", "Project", "Device", "User", "Created", "Status"];

/// One formatted table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRow {
    /// Key id
    pub id: String,
    /// Whether the row checkbox is checked
    pub selected: bool,
    /// Key secret
    pub key: String,
    /// Bound item title
    pub item: String,
    /// Pretty-printed machine info
    pub device: String,
    /// Owner id
    pub user: String,
    /// Creation time, local time zone
    pub created_at: String,
    /// "Active" or "Inactive"
    pub status: &'static str,
}

impl KeyRow {
    /// Format `key` for display
    pub fn new(key: &ApiKey, selected: bool) -> Self {
        Self {
            id: key.id.to_string(),
            selected,
            key: key.key.clone(),
            item: key
                .item
                .as_ref()
                .map_or_else(|| NO_PROJECT.to_string(), |item| item.title.clone()),
            device: format_machine_info(&key.machine_info),
            user: key
                .user_id
                .map_or_else(|| NO_USER.to_string(), |id| id.to_string()),
            created_at: key
                .created_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            status: if key.is_active { "Active" } else { "Inactive" },
        }
    }
}

/// Render machine info as indented JSON, or [`NO_DEVICE`] when empty
pub fn format_machine_info(info: &MachineInfo) -> String {
    if info.is_empty() {
        return NO_DEVICE.to_string();
    }
    serde_json::to_string_pretty(&Value::Object(info.clone()))
        .unwrap_or_else(|_| NO_DEVICE.to_string())
}

/// Render rows as a plain-text table
pub fn render(rows: &[KeyRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", COLUMNS.join(" | "));
    for row in rows {
        let mark = if row.selected { "[x]" } else { "[ ]" };
        let device = row.device.lines().collect::<Vec<_>>().join(" ");
        let _ = writeln!(
            out,
            "{mark} | {} | {} | {} | {} | {} | {} | {}",
            row.id, row.key, row.item, device, row.user, row.created_at, row.status
        );
    }
    out
}
