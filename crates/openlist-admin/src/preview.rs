//! Document preview: fetch an asset and hand its bytes to a renderer.
//!
//! The renderer is an external collaborator behind [`Renderer`]; this module
//! only owns the lifecycle around it. Mounting measures the container,
//! initialises a renderer at that size, fetches the asset and previews it.
//! Fetch and render failures leave the component in
//! [`PreviewState::Failed`] and notify the user. The renderer is disposed
//! exactly once, on [`Preview::unmount`] or drop.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::AdminConfig;
use crate::error::{AdminError, Result};
use crate::notify::{Notification, Notifier};

/// Pixel size of a preview container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Something a renderer can be attached to.
pub trait Container: Send + Sync {
    /// Current pixel size, or `None` if the container does not exist.
    fn measure(&self) -> Option<Viewport>;
}

/// A container of fixed size.
impl Container for Viewport {
    fn measure(&self) -> Option<Viewport> {
        Some(*self)
    }
}

/// External document renderer.
#[async_trait]
pub trait Renderer: Send {
    /// Render the raw bytes of a document.
    async fn preview(&mut self, bytes: Vec<u8>) -> Result<()>;

    /// Release everything the renderer holds.
    fn dispose(&mut self);
}

/// Creates renderers sized to a viewport.
pub trait RendererFactory: Send + Sync {
    fn init(&self, viewport: Viewport) -> Result<Box<dyn Renderer>>;
}

/// Fetches an asset as raw bytes.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// `reqwest`-backed [`AssetFetcher`].
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    http: reqwest::Client,
}

impl HttpAssetFetcher {
    pub fn new(config: &AdminConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdminError::Http {
                status: status.as_u16(),
                path: url.to_owned(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Where a mounted preview stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewState {
    /// Renderer initialised, asset not rendered yet.
    Loading,
    /// The asset was rendered.
    Ready { bytes: usize },
    /// Fetching or rendering failed; shown inline instead of the document.
    Failed(String),
    /// The renderer has been released.
    Disposed,
}

/// A mounted preview and the renderer it owns.
pub struct Preview {
    viewport: Viewport,
    renderer: Option<Box<dyn Renderer>>,
    state: PreviewState,
}

impl Preview {
    /// Mount a preview of `url` into `container`.
    ///
    /// Fails only when no renderer could be created: the container is
    /// missing or the factory refused. Fetch and render failures still
    /// return a mounted preview, in the [`PreviewState::Failed`] state.
    pub async fn mount(
        container: &dyn Container,
        factory: &dyn RendererFactory,
        fetcher: &dyn AssetFetcher,
        url: &str,
        notifier: &dyn Notifier,
    ) -> Result<Self> {
        let viewport = container.measure().ok_or(AdminError::NoContainer)?;
        let renderer = match factory.init(viewport) {
            Ok(r) => r,
            Err(e) => {
                notifier.notify(Notification::error(e.to_string()));
                return Err(e);
            }
        };
        tracing::debug!(width = viewport.width, height = viewport.height, "renderer initialised");

        let mut preview = Self {
            viewport,
            renderer: Some(renderer),
            state: PreviewState::Loading,
        };
        preview.load(fetcher, url, notifier).await;
        Ok(preview)
    }

    async fn load(&mut self, fetcher: &dyn AssetFetcher, url: &str, notifier: &dyn Notifier) {
        let outcome = match fetcher.fetch(url).await {
            Ok(bytes) => {
                let len = bytes.len();
                match self.renderer.as_mut() {
                    Some(renderer) => renderer.preview(bytes).await.map(|()| len),
                    None => Err(AdminError::Render("renderer already disposed".into())),
                }
            }
            Err(e) => Err(e),
        };

        self.state = match outcome {
            Ok(len) => {
                tracing::info!(url, bytes = len, "preview rendered");
                PreviewState::Ready { bytes: len }
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "preview failed");
                notifier.notify(Notification::error(e.to_string()));
                PreviewState::Failed(e.to_string())
            }
        };
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Tear the preview down, releasing the renderer.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.dispose();
            self.state = PreviewState::Disposed;
            tracing::debug!("renderer disposed");
        }
    }
}

impl Drop for Preview {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Preview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preview")
            .field("viewport", &self.viewport)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
