//! Plugin administration client for OpenList.
//!
//! This crate provides:
//!
//! - **HTTP adapter**: [`PluginApi`] and its `reqwest` implementation
//!   [`HttpPluginApi`], returning the backend's `{code, message, data}`
//!   [`Envelope`]s.
//!
//! - **Response handling**: [`ResponseHandler`] unwraps envelopes and turns
//!   failures into user-visible [`Notification`]s.
//!
//! - **Registry view-model**: [`PluginRegistry`], a read-through cache of
//!   the backend plugin list, replaced wholesale on every refresh.
//!
//! - **Controllers**: [`PluginController`] (check / update / uninstall /
//!   check all) and [`InstallController`] (install by source, upload a
//!   package), guarded by explicit in-flight tracking ([`InFlight`]).
//!
//! - **Preview**: [`Preview`], which fetches a document and hands it to an
//!   external [`Renderer`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use openlist_admin::{AdminConfig, PluginConsole, TracingNotifier};
//!
//! # async fn run() -> openlist_admin::Result<()> {
//! let config = AdminConfig::load(None)?;
//! let console = PluginConsole::connect(&config, Arc::new(TracingNotifier))?;
//!
//! console.open().await?;
//! for plugin in console.registry().plugins().iter() {
//!     println!("{} {} [{}]", plugin.name, plugin.version, plugin.status);
//! }
//! console.plugins().check_all_updates().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod busy;
pub mod config;
pub mod console;
pub mod controller;
pub mod envelope;
pub mod error;
pub mod install;
pub mod notify;
pub mod preview;
pub mod registry;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::{HttpPluginApi, PluginApi};
pub use busy::{Action, BusyGuard, InFlight};
pub use config::AdminConfig;
pub use console::PluginConsole;
pub use controller::PluginController;
pub use envelope::{Envelope, ResponseHandler};
pub use error::{AdminError, Result};
pub use install::{FilePicker, InstallController};
pub use notify::{Level, Message, Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use preview::{
    AssetFetcher, Container, HttpAssetFetcher, Preview, PreviewState, Renderer, RendererFactory,
    Viewport,
};
pub use registry::{PluginList, PluginRegistry};
pub use types::{Plugin, PluginStatus, UpdateCheck, UpdateMap};
