//! Console view-models for the key-management platform
//!
//! Framework-neutral state for the screens of the console: the key table
//! with its selection, paging and batch actions, the navigation shell and
//! the sign-up form. The `keyconsole` binary drives them from the terminal.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod clipboard;
pub mod key_management;
pub mod key_table;
pub mod navigation;
pub mod notifications;
pub mod pagination;
pub mod register;
pub mod selection;
pub mod state;

pub use clipboard::{Clipboard, MemoryClipboard, SystemClipboard};
pub use key_management::{DeleteStrategy, KeyManagementView, LoadTicket};
pub use key_table::KeyRow;
pub use navigation::{NavigationShell, Resolution, Route, SidebarItem, sidebar};
pub use notifications::{Notification, NotificationLevel, NotificationLog, Notifier};
pub use pagination::PageState;
pub use register::{FieldError, RegisterForm, RegisterOutcome};
pub use selection::{HeaderCheckbox, Selection};
pub use state::ConsoleState;
