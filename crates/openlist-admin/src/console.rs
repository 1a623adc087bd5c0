//! The plugin console: registry and controllers wired to one backend.

use std::sync::Arc;

use crate::api::{HttpPluginApi, PluginApi};
use crate::busy::InFlight;
use crate::config::AdminConfig;
use crate::controller::PluginController;
use crate::envelope::ResponseHandler;
use crate::error::Result;
use crate::install::InstallController;
use crate::notify::Notifier;
use crate::registry::PluginRegistry;

/// Everything the plugin management page needs, sharing one API client,
/// one notifier and one in-flight set.
pub struct PluginConsole {
    registry: Arc<PluginRegistry>,
    plugins: PluginController,
    installer: InstallController,
    flights: InFlight,
}

impl PluginConsole {
    /// Assemble a console around an existing API client.
    pub fn new(api: Arc<dyn PluginApi>, notifier: Arc<dyn Notifier>, config: &AdminConfig) -> Self {
        let handler = ResponseHandler::new(notifier, config.success_code);
        let flights = InFlight::new();
        let registry = Arc::new(PluginRegistry::new(api.clone(), handler.clone()));
        let plugins = PluginController::new(
            api.clone(),
            handler.clone(),
            registry.clone(),
            flights.clone(),
        );
        let installer = InstallController::new(
            api,
            handler,
            registry.clone(),
            flights.clone(),
            config.upload_accept.clone(),
        );
        Self {
            registry,
            plugins,
            installer,
            flights,
        }
    }

    /// Assemble a console talking HTTP to `config.base_url`.
    pub fn connect(config: &AdminConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        config.validate()?;
        let api = HttpPluginApi::new(config)?;
        tracing::info!(base_url = %api.base_url(), "plugin console connected");
        Ok(Self::new(Arc::new(api), notifier, config))
    }

    /// Initial load, as done when the page is first shown.
    pub async fn open(&self) -> Result<usize> {
        self.registry.refresh().await
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Per-plugin actions and the bulk update check.
    pub fn plugins(&self) -> &PluginController {
        &self.plugins
    }

    /// Install dialog and upload picker.
    pub fn installer(&self) -> &InstallController {
        &self.installer
    }

    /// Whether any action is outstanding.
    pub fn is_busy(&self) -> bool {
        !self.flights.is_empty()
    }
}

impl std::fmt::Debug for PluginConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginConsole")
            .field("registry", &self.registry)
            .field("in_flight", &self.flights.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
