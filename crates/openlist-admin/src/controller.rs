//! Per-plugin actions and the bulk update check.

use std::sync::Arc;

use crate::api::PluginApi;
use crate::busy::{Action, InFlight};
use crate::envelope::ResponseHandler;
use crate::error::Result;
use crate::notify::{Message, Notification};
use crate::registry::PluginRegistry;
use crate::types::{Plugin, UpdateMap};

/// Drives check-update, update and uninstall for individual plugins.
///
/// Each action holds a busy flag keyed by `(plugin id, action)` for the
/// duration of its request. A repeated call for the same pair is refused
/// with [`AdminError::Busy`](crate::AdminError::Busy) before any request is
/// sent.
#[derive(Clone)]
pub struct PluginController {
    api: Arc<dyn PluginApi>,
    handler: ResponseHandler,
    registry: Arc<PluginRegistry>,
    flights: InFlight,
}

impl PluginController {
    pub fn new(
        api: Arc<dyn PluginApi>,
        handler: ResponseHandler,
        registry: Arc<PluginRegistry>,
        flights: InFlight,
    ) -> Self {
        Self {
            api,
            handler,
            registry,
            flights,
        }
    }

    /// Ask whether a newer version of `id` exists.
    ///
    /// Returns the new version, if any. Never touches the registry.
    pub async fn check_update(&self, id: &str) -> Result<Option<String>> {
        let _busy = self.flights.begin(Some(id), Action::Check)?;

        let response = self.api.check_one(id).await;
        self.handler.handle(response, |data| {
            let new_version = data
                .and_then(|d| d.new_version)
                .filter(|v| !v.is_empty());
            let notification = match &new_version {
                Some(version) => Notification::success(Message::UpdateAvailable {
                    version: version.clone(),
                }),
                None => Notification::info(Message::NoUpdateAvailable),
            };
            self.handler.notifier().notify(notification);
            tracing::info!(plugin_id = %id, new_version = ?new_version, "update check finished");
            new_version
        })
    }

    /// Update `id` on the backend, then refresh the registry.
    pub async fn update_plugin(&self, id: &str) -> Result<Option<Plugin>> {
        let _busy = self.flights.begin(Some(id), Action::Update)?;

        let response = self.api.update(id).await;
        let updated = self.handler.handle(response, |data| {
            self.handler
                .notifier()
                .notify(Notification::success(Message::UpdateSuccess));
            tracing::info!(plugin_id = %id, "plugin updated");
            data
        })?;
        self.refresh_after_mutation().await;
        Ok(updated)
    }

    /// Remove `id` from the backend, then refresh the registry.
    ///
    /// Returns the backend's confirmation text, if it sent one.
    pub async fn uninstall_plugin(&self, id: &str) -> Result<Option<String>> {
        let _busy = self.flights.begin(Some(id), Action::Uninstall)?;

        let response = self.api.uninstall(id).await;
        let message = self.handler.handle(response, |data| {
            self.handler
                .notifier()
                .notify(Notification::success(Message::DeleteSuccess));
            tracing::info!(plugin_id = %id, "plugin uninstalled");
            data
        })?;
        self.refresh_after_mutation().await;
        Ok(message)
    }

    /// Count plugins with a pending update.
    ///
    /// Only the number of entries is reported; the registry is not touched.
    pub async fn check_all_updates(&self) -> Result<UpdateMap> {
        let _busy = self.flights.begin(None, Action::CheckAll)?;

        let response = self.api.check_all().await;
        self.handler.handle(response, |data| {
            let updates = data.unwrap_or_default();
            let notification = match updates.len() {
                0 => Notification::info(Message::AllUpToDate),
                count => Notification::success(Message::UpdatesFound { count }),
            };
            self.handler.notifier().notify(notification);
            tracing::info!(count = updates.len(), "bulk update check finished");
            updates
        })
    }

    pub fn is_checking(&self, id: &str) -> bool {
        self.flights.is_busy(Some(id), Action::Check)
    }

    pub fn is_updating(&self, id: &str) -> bool {
        self.flights.is_busy(Some(id), Action::Update)
    }

    pub fn is_uninstalling(&self, id: &str) -> bool {
        self.flights.is_busy(Some(id), Action::Uninstall)
    }

    pub fn is_checking_all(&self) -> bool {
        self.flights.is_busy(None, Action::CheckAll)
    }

    /// A failed refresh already notified the user; the mutation itself
    /// succeeded, so its result stands.
    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.registry.refresh().await {
            tracing::warn!(error = %e, "refresh after mutation failed");
        }
    }
}

impl std::fmt::Debug for PluginController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginController")
            .field("in_flight", &self.flights.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
