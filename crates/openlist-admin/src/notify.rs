//! User-visible notifications.
//!
//! Controllers never print or log on behalf of the view; they emit a
//! [`Notification`] into a [`Notifier`] and let the front-end decide how to
//! show it.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// What happened, independent of how it is worded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A newer version of a single plugin exists.
    UpdateAvailable { version: String },
    /// The checked plugin is already current.
    NoUpdateAvailable,
    /// A bulk check found this many updatable plugins.
    UpdatesFound { count: usize },
    /// A bulk check found nothing to update.
    AllUpToDate,
    UpdateSuccess,
    DeleteSuccess,
    InstallSuccess,
    /// Transport or backend failure, with the supplied message.
    Failure(String),
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateAvailable { version } => {
                write!(f, "Update available, version {version}")
            }
            Self::NoUpdateAvailable => f.write_str("Already up to date"),
            Self::UpdatesFound { count } => write!(f, "{count} update(s) found"),
            Self::AllUpToDate => f.write_str("All plugins are up to date"),
            Self::UpdateSuccess => f.write_str("Plugin updated"),
            Self::DeleteSuccess => f.write_str("Deleted successfully"),
            Self::InstallSuccess => f.write_str("Installed successfully"),
            Self::Failure(reason) => f.write_str(reason),
        }
    }
}

/// A single notification destined for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: Message,
}

impl Notification {
    pub fn success(message: Message) -> Self {
        Self {
            level: Level::Success,
            message,
        }
    }

    pub fn info(message: Message) -> Self {
        Self {
            level: Level::Info,
            message,
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: Message::Failure(reason.into()),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.message, f)
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits notifications as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Success | Level::Info => {
                tracing::info!(kind = ?notification.level, "{notification}")
            }
            Level::Warning => tracing::warn!("{notification}"),
            Level::Error => tracing::error!("{notification}"),
        }
    }
}

/// Keeps every notification in memory, in emission order.
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all notifications received so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// The most recent notification, if any.
    pub fn last(&self) -> Option<Notification> {
        self.seen.lock().ok().and_then(|v| v.last().cloned())
    }

    pub fn clear(&self) {
        if let Ok(mut v) = self.seen.lock() {
            v.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut v) = self.seen.lock() {
            v.push(notification);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
