//! Error types for the plugin administration client.
//!
//! Every controller and the HTTP adapter surface failures through
//! [`AdminError`]. Transport problems, backend-reported failures and
//! client-side rejections are separate variants so callers can react
//! without inspecting message strings.

use std::path::PathBuf;

use crate::busy::Action;

/// Unified error type for the admin client.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// The request never produced a usable response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success envelope.
    #[error("{message} (code {code})")]
    Backend { code: i64, message: String },

    /// The backend answered with a non-2xx status and no envelope.
    #[error("HTTP {status} from `{path}`")]
    Http { status: u16, path: String },

    /// A response body could not be decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The install source field was empty.
    #[error("plugin source must not be empty")]
    EmptySource,

    /// No file is selected in the upload picker.
    #[error("no plugin file selected")]
    NoFileSelected,

    /// The file picker's extension filter refused a file.
    #[error("`{}` does not match the `{accept}` filter", .path.display())]
    Filtered { path: PathBuf, accept: String },

    /// The same action is already in flight for this target.
    #[error("`{action}` is already in progress for `{target}`")]
    Busy { target: String, action: Action },

    /// The preview container could not be measured.
    #[error("preview container is not available")]
    NoContainer,

    /// The renderer rejected the document.
    #[error("render failed: {0}")]
    Render(String),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The configuration file is not valid TOML.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configured base URL is not a URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AdminError>;
