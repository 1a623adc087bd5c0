//! Plugin ingestion: install by source reference, or upload a package.
//!
//! The two paths are independent. Each has its own busy flag and neither
//! blocks the other.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::api::PluginApi;
use crate::busy::{Action, InFlight};
use crate::envelope::ResponseHandler;
use crate::error::{AdminError, Result};
use crate::notify::{Message, Notification};
use crate::registry::PluginRegistry;
use crate::types::Plugin;

/// Single-file picker with an extension filter.
///
/// The filter applies when a file is chosen; uploads do not check it again.
#[derive(Debug)]
pub struct FilePicker {
    accept: String,
    selected: Mutex<Option<PathBuf>>,
}

impl FilePicker {
    /// `accept` is an extension such as `.zip`; an empty filter allows all.
    pub fn new(accept: impl Into<String>) -> Self {
        Self {
            accept: accept.into(),
            selected: Mutex::new(None),
        }
    }

    pub fn accept(&self) -> &str {
        &self.accept
    }

    /// Whether `path` passes the extension filter (case-insensitive).
    pub fn accepts(&self, path: &Path) -> bool {
        let wanted = self.accept.trim_start_matches('.');
        if wanted.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
    }

    /// Choose `path`, replacing any previous selection.
    pub fn select(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if !self.accepts(&path) {
            return Err(AdminError::Filtered {
                path,
                accept: self.accept.clone(),
            });
        }
        if let Ok(mut slot) = self.selected.lock() {
            *slot = Some(path);
        }
        Ok(())
    }

    pub fn selected(&self) -> Option<PathBuf> {
        self.selected.lock().ok().and_then(|s| s.clone())
    }

    /// Reset the selection so the same file can be chosen again.
    pub fn clear(&self) {
        if let Ok(mut slot) = self.selected.lock() {
            *slot = None;
        }
    }
}

/// Install dialog state and the two ingestion actions.
pub struct InstallController {
    api: Arc<dyn PluginApi>,
    handler: ResponseHandler,
    registry: Arc<PluginRegistry>,
    flights: InFlight,
    dialog_open: AtomicBool,
    source: Mutex<String>,
    picker: FilePicker,
}

impl InstallController {
    pub fn new(
        api: Arc<dyn PluginApi>,
        handler: ResponseHandler,
        registry: Arc<PluginRegistry>,
        flights: InFlight,
        accept: impl Into<String>,
    ) -> Self {
        Self {
            api,
            handler,
            registry,
            flights,
            dialog_open: AtomicBool::new(false),
            source: Mutex::new(String::new()),
            picker: FilePicker::new(accept),
        }
    }

    // -- install dialog ----------------------------------------------------

    pub fn open_dialog(&self) {
        self.dialog_open.store(true, Ordering::SeqCst);
    }

    /// Close without submitting. The source field keeps its text.
    pub fn close_dialog(&self) {
        self.dialog_open.store(false, Ordering::SeqCst);
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open.load(Ordering::SeqCst)
    }

    pub fn set_source(&self, source: impl Into<String>) {
        if let Ok(mut s) = self.source.lock() {
            *s = source.into();
        }
    }

    pub fn source(&self) -> String {
        self.source.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Submit the source field to the install endpoint.
    ///
    /// An empty field is refused locally and nothing is sent. The field is
    /// taken as-is; its URL shape is the backend's concern. On success the
    /// dialog closes, the field resets and the registry refreshes.
    pub async fn submit_install(&self) -> Result<Option<Plugin>> {
        let source = self.source();
        if source.is_empty() {
            return Err(AdminError::EmptySource);
        }

        let _busy = self.flights.begin(None, Action::Install)?;
        tracing::info!(source = %source, "installing plugin");

        let response = self.api.install(&source).await;
        let installed = self.handler.handle(response, |data| {
            self.handler
                .notifier()
                .notify(Notification::success(Message::InstallSuccess));
            data
        })?;

        self.close_dialog();
        self.set_source(String::new());
        self.refresh_after_ingest().await;
        Ok(installed)
    }

    // -- upload --------------------------------------------------------------

    pub fn picker(&self) -> &FilePicker {
        &self.picker
    }

    /// Upload the file currently selected in the picker.
    ///
    /// The selection is cleared afterwards whatever the outcome.
    pub async fn upload_selected(&self) -> Result<Option<Plugin>> {
        let path = self.picker.selected().ok_or(AdminError::NoFileSelected)?;
        let _clear = ClearOnDrop(&self.picker);

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) => {
                let err = AdminError::from(e);
                self.handler.report(&err);
                return Err(err);
            }
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "plugin.zip".to_owned());

        self.upload_bytes(&file_name, bytes).await
    }

    /// Upload an in-memory package as multipart field `file`.
    pub async fn upload_bytes(&self, file_name: &str, bytes: Vec<u8>) -> Result<Option<Plugin>> {
        let _busy = self.flights.begin(None, Action::Upload)?;
        tracing::info!(file = %file_name, size = bytes.len(), "uploading plugin package");

        let response = self.api.upload(file_name, bytes).await;
        let installed = self.handler.handle(response, |data| {
            self.handler
                .notifier()
                .notify(Notification::success(Message::InstallSuccess));
            data
        })?;

        self.refresh_after_ingest().await;
        Ok(installed)
    }

    pub fn is_installing(&self) -> bool {
        self.flights.is_busy(None, Action::Install)
    }

    pub fn is_uploading(&self) -> bool {
        self.flights.is_busy(None, Action::Upload)
    }

    async fn refresh_after_ingest(&self) {
        if let Err(e) = self.registry.refresh().await {
            tracing::warn!(error = %e, "refresh after install failed");
        }
    }
}

impl std::fmt::Debug for InstallController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallController")
            .field("dialog_open", &self.is_dialog_open())
            .field("picker", &self.picker)
            .finish_non_exhaustive()
    }
}

struct ClearOnDrop<'a>(&'a FilePicker);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::notify::{Level, RecordingNotifier};
    use crate::testing::{Call, MockApi, plugin};

    struct Fixture {
        api: Arc<MockApi>,
        registry: Arc<PluginRegistry>,
        install: Arc<InstallController>,
        notes: RecordingNotifier,
    }

    fn fixture() -> Fixture {
        let api = Arc::new(MockApi::new());
        let notes = RecordingNotifier::new();
        let handler = ResponseHandler::new(Arc::new(notes.clone()), 200);
        let registry = Arc::new(PluginRegistry::new(api.clone(), handler.clone()));
        let install = Arc::new(InstallController::new(
            api.clone(),
            handler,
            registry.clone(),
            InFlight::new(),
            ".zip",
        ));
        Fixture {
            api,
            registry,
            install,
            notes,
        }
    }

    #[tokio::test]
    async fn empty_source_sends_nothing() {
        let fx = fixture();
        fx.install.open_dialog();

        let err = fx.install.submit_install().await.unwrap_err();

        assert!(matches!(err, AdminError::EmptySource));
        assert!(fx.api.calls().is_empty());
        assert!(fx.install.is_dialog_open());
        assert!(!fx.install.is_installing());
    }

    #[tokio::test]
    async fn install_success_closes_resets_and_refreshes_once() {
        let fx = fixture();
        fx.install.open_dialog();
        fx.install.set_source("https://github.com/user/my-openlist-plugin");
        fx.api.push_install(Ok(Envelope::ok(plugin("mine"))));
        fx.api.push_list(Ok(Envelope::ok(vec![plugin("mine")])));

        let installed = fx.install.submit_install().await.unwrap();

        assert_eq!(installed.unwrap().id, "mine");
        assert!(!fx.install.is_dialog_open());
        assert!(fx.install.source().is_empty());
        assert_eq!(fx.api.list_calls(), 1);
        assert_eq!(
            fx.api.calls()[0],
            Call::Install("https://github.com/user/my-openlist-plugin".into())
        );
        assert!(fx.registry.get("mine").is_some());
        assert_eq!(fx.notes.last().unwrap().message, Message::InstallSuccess);
    }

    #[tokio::test]
    async fn source_is_not_url_validated() {
        let fx = fixture();
        fx.install.set_source("not a url at all");
        fx.api.push_install(Ok(Envelope::failure(400, "invalid source")));

        let err = fx.install.submit_install().await.unwrap_err();

        assert!(matches!(err, AdminError::Backend { code: 400, .. }));
        assert_eq!(fx.api.calls(), vec![Call::Install("not a url at all".into())]);
        // Failure keeps the field so the user can fix it.
        assert_eq!(fx.install.source(), "not a url at all");
        assert_eq!(fx.notes.last().unwrap().level, Level::Error);
        assert!(!fx.install.is_installing());
    }

    #[test]
    fn cancel_keeps_source() {
        let fx = fixture();
        fx.install.open_dialog();
        fx.install.set_source("github:user/repo");
        fx.install.close_dialog();
        assert!(!fx.install.is_dialog_open());
        assert_eq!(fx.install.source(), "github:user/repo");
    }

    #[test]
    fn picker_filters_by_extension() {
        let picker = FilePicker::new(".zip");
        assert!(picker.accepts(Path::new("plugin.zip")));
        assert!(picker.accepts(Path::new("PLUGIN.ZIP")));
        assert!(!picker.accepts(Path::new("plugin.tar.gz")));
        assert!(!picker.accepts(Path::new("zip")));
        assert!(picker.select("notes.txt").is_err());
        assert!(picker.selected().is_none());

        let any = FilePicker::new("");
        assert!(any.accepts(Path::new("whatever.bin")));
    }

    #[tokio::test]
    async fn upload_success_refreshes_once_and_clears_picker() {
        let fx = fixture();
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("thumb.zip");
        std::fs::write(&path, b"PK\x03\x04fake").unwrap();

        fx.install.picker().select(&path).unwrap();
        fx.api.push_upload(Ok(Envelope::ok(plugin("thumb"))));
        fx.api.push_list(Ok(Envelope::ok(vec![plugin("thumb")])));

        let installed = fx.install.upload_selected().await.unwrap();

        assert_eq!(installed.unwrap().id, "thumb");
        assert_eq!(
            fx.api.calls(),
            vec![
                Call::Upload {
                    file_name: "thumb.zip".into(),
                    size: 8
                },
                Call::List
            ]
        );
        assert!(fx.install.picker().selected().is_none());
        assert!(!fx.install.is_uploading());
        assert_eq!(fx.notes.last().unwrap().message, Message::InstallSuccess);
    }

    #[tokio::test]
    async fn upload_failure_still_clears_picker() {
        let fx = fixture();
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.zip");
        std::fs::write(&path, b"garbage").unwrap();

        fx.install.picker().select(&path).unwrap();
        fx.api.push_upload(Ok(Envelope::failure(500, "not a plugin archive")));

        assert!(fx.install.upload_selected().await.is_err());
        assert!(fx.install.picker().selected().is_none());
        assert_eq!(fx.api.list_calls(), 0);
        assert!(!fx.install.is_uploading());
        assert_eq!(fx.notes.last().unwrap().to_string(), "not a plugin archive");
    }

    #[tokio::test]
    async fn unreadable_file_notifies_and_clears() {
        let fx = fixture();
        let tmp = tempfile::tempdir().unwrap();
        fx.install
            .picker()
            .select(tmp.path().join("vanished.zip"))
            .unwrap();

        let err = fx.install.upload_selected().await.unwrap_err();

        assert!(matches!(err, AdminError::Io(_)));
        assert!(fx.api.calls().is_empty());
        assert!(fx.install.picker().selected().is_none());
        assert_eq!(fx.notes.last().unwrap().level, Level::Error);
    }

    #[tokio::test]
    async fn upload_without_selection_is_refused() {
        let fx = fixture();
        let err = fx.install.upload_selected().await.unwrap_err();
        assert!(matches!(err, AdminError::NoFileSelected));
        assert!(fx.api.calls().is_empty());
    }

    #[tokio::test]
    async fn install_and_upload_do_not_block_each_other() {
        let fx = fixture();
        fx.install.set_source("https://example.com/a");
        let gate = fx.api.push_install_gated();

        let pending = tokio::spawn({
            let install = fx.install.clone();
            async move { install.submit_install().await }
        });
        fx.api.wait_for_calls(1).await;
        assert!(fx.install.is_installing());

        // A second install is refused while the first is outstanding.
        assert!(matches!(
            fx.install.submit_install().await,
            Err(AdminError::Busy { .. })
        ));

        fx.api.push_upload(Ok(Envelope::ok(plugin("b"))));
        fx.install
            .upload_bytes("b.zip", b"PK".to_vec())
            .await
            .unwrap();

        gate.send(Ok(Envelope::ok(plugin("a")))).unwrap();
        pending.await.unwrap().unwrap();
        assert!(!fx.install.is_installing());
        assert!(!fx.install.is_uploading());
    }
}
