//! Transient user notifications
//!
//! View-model actions never return errors to the caller; every outcome,
//! good or bad, is reported through a [`Notifier`].

use parking_lot::Mutex;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Default time a notification stays visible
pub const DEFAULT_DURATION: Duration = Duration::from_millis(2000);

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Action completed
    Success,
    /// Action partly completed
    Warning,
    /// Action failed
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A message shown to the user for a limited time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Headline
    pub title: String,
    /// Optional detail, usually the server's error message
    pub description: Option<String>,
    /// How long the notification stays visible
    pub duration: Duration,
}

impl Notification {
    fn new(level: NotificationLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
            duration: DEFAULT_DURATION,
        }
    }

    /// Success notification
    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title)
    }

    /// Partial-success notification
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title)
    }

    /// Failure notification
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title)
    }

    /// Attach a detail line
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the display duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.title)?;
        if let Some(description) = &self.description {
            write!(f, ": {description}")?;
        }
        Ok(())
    }
}

/// Sink for notifications
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Show `notification`
    fn notify(&self, notification: Notification);
}

/// Notifier that keeps every notification in memory
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every notification so far
    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    /// Most recent notification
    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().last().cloned()
    }

    /// Remove and return every notification so far
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!(title = %notification.title, "notification"),
            NotificationLevel::Warning | NotificationLevel::Error => {
                warn!(title = %notification.title, description = ?notification.description, "notification");
            }
        }
        self.entries.lock().push(notification);
    }
}
