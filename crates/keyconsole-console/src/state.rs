//! Application state shared by the console front-ends

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::key_management::KeyManagementView;
use crate::navigation::NavigationShell;
use crate::notifications::{NotificationLog, Notifier};
use keyconsole_client::{ClientResult, KeyConsoleClient};
use keyconsole_core::Config;
use std::sync::Arc;

/// Configuration plus the long-lived collaborators every screen uses
#[derive(Debug, Clone)]
pub struct ConsoleState {
    /// Loaded configuration
    pub config: Config,
    /// Backend client; clones share one session and one cache
    pub client: KeyConsoleClient,
    /// Notification log the front-end drains and displays
    pub notifications: Arc<NotificationLog>,
    /// Clipboard capability
    pub clipboard: Arc<dyn Clipboard>,
}

impl ConsoleState {
    /// Build state from configuration with the system clipboard
    pub fn new(config: Config) -> ClientResult<Self> {
        let client = KeyConsoleClient::from_config(&config)?;
        Ok(Self::with_parts(config, client, Arc::new(SystemClipboard::new())))
    }

    /// Build state from explicit parts
    pub fn with_parts(config: Config, client: KeyConsoleClient, clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            config,
            client,
            notifications: Arc::new(NotificationLog::new()),
            clipboard,
        }
    }

    /// Fresh key-management view
    pub fn key_view(&self) -> KeyManagementView {
        let notifier: Arc<dyn Notifier> = self.notifications.clone();
        KeyManagementView::new(
            self.client.clone(),
            notifier,
            Arc::clone(&self.clipboard),
            &self.config.console,
        )
    }

    /// Navigation shell bound to the client's session
    pub fn navigation(&self) -> NavigationShell {
        NavigationShell::new(self.client.session().clone())
    }
}
