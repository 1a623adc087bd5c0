//! Client configuration.
//!
//! Values are layered, lowest precedence first:
//!
//! 1. built-in defaults,
//! 2. the `[admin]` table of a TOML file (`config/default.toml` unless a
//!    path is given),
//! 3. environment variables (`OPENLIST_URL`, `OPENLIST_TOKEN`,
//!    `OPENLIST_TIMEOUT_SECS`).
//!
//! Command-line overrides are applied by the binary on top of the result.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::envelope::DEFAULT_SUCCESS_CODE;
use crate::error::{AdminError, Result};

/// Config file read when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5244/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for talking to an OpenList backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// API root; endpoint paths are appended to it.
    pub base_url: String,

    /// Pre-issued admin token sent as the `Authorization` header.
    pub token: Option<String>,

    /// Per-request timeout of the HTTP client.
    pub timeout_secs: u64,

    /// Envelope code that means success.
    pub success_code: i64,

    pub user_agent: String,

    /// Extension filter applied by the upload file picker.
    pub upload_accept: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            success_code: DEFAULT_SUCCESS_CODE,
            user_agent: concat!("openlist-admin/", env!("CARGO_PKG_VERSION")).to_owned(),
            upload_accept: ".zip".to_owned(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    admin: AdminConfig,
}

impl AdminConfig {
    /// Load defaults, then the config file, then the environment.
    ///
    /// An explicit `path` must exist; the default path may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p).map_err(|e| {
                    AdminError::Config(format!("cannot read `{}`: {e}", p.display()))
                })?;
                Self::from_toml_str(&content)?
            }
            None => match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
                Ok(content) => Self::from_toml_str(&content)?,
                Err(_) => {
                    tracing::debug!(path = DEFAULT_CONFIG_PATH, "no config file, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse the `[admin]` table of a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.admin)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparsable numeric values are ignored with a warning.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("OPENLIST_URL").filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(token) = lookup("OPENLIST_TOKEN").filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        if let Some(raw) = lookup("OPENLIST_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => {
                    tracing::warn!(value = %raw, "ignoring invalid OPENLIST_TIMEOUT_SECS")
                }
            }
        }
    }

    /// Check that the settings can produce a working client.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AdminError::Config(format!(
                "base_url must use http or https, got `{}`",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(AdminError::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
