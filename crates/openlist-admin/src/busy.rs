//! In-flight request tracking.
//!
//! Every controller action registers a `(target, action)` key before it
//! issues its request. A second registration of the same key is refused, so
//! overlapping calls are rejected rather than merely hidden behind a
//! disabled button. The key is released when the returned [`BusyGuard`] is
//! dropped, which happens on success, failure and cancellation alike.

use std::fmt;
use std::sync::Arc;

use dashmap::DashSet;

use crate::error::{AdminError, Result};

/// Actions that carry a busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Single-plugin update check (`checking`).
    Check,
    /// Plugin update (`updating`).
    Update,
    /// Plugin removal (`uninstalling`).
    Uninstall,
    /// Bulk update check (`checking_all`).
    CheckAll,
    /// Install by source reference (`installing`).
    Install,
    /// Package upload (`uploading`).
    Upload,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Check => "check",
            Self::Update => "update",
            Self::Uninstall => "uninstall",
            Self::CheckAll => "check all",
            Self::Install => "install",
            Self::Upload => "upload",
        };
        f.write_str(s)
    }
}

/// Console-wide actions are keyed without a plugin id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    target: Option<String>,
    action: Action,
}

/// Set of outstanding `(target, action)` pairs. Cloning shares the set.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    keys: Arc<DashSet<Key>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `action` on `target` as in flight.
    ///
    /// `target` is a plugin id, or `None` for console-wide actions.
    pub fn begin(&self, target: Option<&str>, action: Action) -> Result<BusyGuard> {
        let key = Key {
            target: target.map(str::to_owned),
            action,
        };
        if !self.keys.insert(key.clone()) {
            return Err(AdminError::Busy {
                target: target.unwrap_or("console").to_owned(),
                action,
            });
        }
        tracing::debug!(target_id = ?target, %action, "action started");
        Ok(BusyGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    /// Whether `action` on `target` is currently in flight.
    pub fn is_busy(&self, target: Option<&str>, action: Action) -> bool {
        self.keys.contains(&Key {
            target: target.map(str::to_owned),
            action,
        })
    }

    /// Number of outstanding actions across all targets.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Clears its busy flag when dropped.
#[derive(Debug)]
#[must_use = "the busy flag clears as soon as the guard is dropped"]
pub struct BusyGuard {
    keys: Arc<DashSet<Key>>,
    key: Key,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.keys.remove(&self.key);
        tracing::debug!(target_id = ?self.key.target, action = %self.key.action, "action finished");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_clears_on_drop() {
        let flights = InFlight::new();
        {
            let _g = flights.begin(Some("p1"), Action::Update).unwrap();
            assert!(flights.is_busy(Some("p1"), Action::Update));
        }
        assert!(!flights.is_busy(Some("p1"), Action::Update));
        assert!(flights.is_empty());
    }

    #[test]
    fn same_key_is_rejected() {
        let flights = InFlight::new();
        let _g = flights.begin(Some("p1"), Action::Check).unwrap();
        let err = flights.begin(Some("p1"), Action::Check).unwrap_err();
        assert!(matches!(
            err,
            AdminError::Busy {
                action: Action::Check,
                ..
            }
        ));
    }

    #[test]
    fn different_targets_and_actions_are_independent() {
        let flights = InFlight::new();
        let _a = flights.begin(Some("p1"), Action::Check).unwrap();
        let _b = flights.begin(Some("p2"), Action::Check).unwrap();
        let _c = flights.begin(Some("p1"), Action::Uninstall).unwrap();
        let _d = flights.begin(None, Action::Install).unwrap();
        let _e = flights.begin(None, Action::Upload).unwrap();
        assert_eq!(flights.len(), 5);
    }

    #[test]
    fn console_wide_busy_error_names_console() {
        let flights = InFlight::new();
        let _g = flights.begin(None, Action::CheckAll).unwrap();
        let err = flights.begin(None, Action::CheckAll).unwrap_err();
        assert_eq!(
            err.to_string(),
            "`check all` is already in progress for `console`"
        );
    }
}
