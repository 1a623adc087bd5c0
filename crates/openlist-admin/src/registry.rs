//! Plugin registry view-model.
//!
//! A read-through cache of the backend's plugin list. The list is never
//! edited locally: every refresh replaces it wholesale, and every mutating
//! action elsewhere ends with a refresh. Views observe replacements through
//! [`PluginRegistry::subscribe`].

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

use crate::api::PluginApi;
use crate::envelope::ResponseHandler;
use crate::error::Result;
use crate::types::Plugin;

/// Snapshot of the registry contents.
pub type PluginList = Arc<Vec<Plugin>>;

/// Holds the current plugin sequence and the `loading` flag.
pub struct PluginRegistry {
    api: Arc<dyn PluginApi>,
    handler: ResponseHandler,
    plugins: watch::Sender<PluginList>,
    pending: Arc<AtomicUsize>,
}

impl PluginRegistry {
    pub fn new(api: Arc<dyn PluginApi>, handler: ResponseHandler) -> Self {
        let (plugins, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            api,
            handler,
            plugins,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Re-fetch the full list from the backend.
    ///
    /// On success the sequence is replaced in one step and the new length is
    /// returned. On failure the previous sequence stays untouched and an
    /// error notification is emitted. Concurrent calls are not merged: each
    /// successful completion replaces the list, so the last one to finish
    /// wins.
    pub async fn refresh(&self) -> Result<usize> {
        let _loading = Loading::start(&self.pending);

        let response = self.api.list().await;
        self.handler.handle(response, |data| {
            let list = dedupe(data.unwrap_or_default());
            let len = list.len();
            self.plugins.send_replace(Arc::new(list));
            tracing::debug!(count = len, "plugin list replaced");
            len
        })
    }

    /// Current plugin sequence.
    pub fn plugins(&self) -> PluginList {
        self.plugins.borrow().clone()
    }

    /// Look up a plugin by id in the current sequence.
    pub fn get(&self, id: &str) -> Option<Plugin> {
        self.plugins.borrow().iter().find(|p| p.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.plugins.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.borrow().is_empty()
    }

    /// Whether at least one refresh is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Receive every replacement of the plugin sequence.
    pub fn subscribe(&self) -> watch::Receiver<PluginList> {
        self.plugins.subscribe()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.len())
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

/// Keeps the `loading` counter raised for its lifetime.
struct Loading(Arc<AtomicUsize>);

impl Loading {
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for Loading {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Keep the first record for every id.
fn dedupe(list: Vec<Plugin>) -> Vec<Plugin> {
    let mut seen = HashSet::with_capacity(list.len());
    let before = list.len();
    let unique: Vec<Plugin> = list
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect();
    if unique.len() != before {
        tracing::warn!(
            dropped = before - unique.len(),
            "backend returned duplicate plugin ids"
        );
    }
    unique
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
