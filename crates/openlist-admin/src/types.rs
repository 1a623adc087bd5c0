//! Plugin records and update-check payloads as served by the backend.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One installed plugin, exactly as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    /// Unique stable identifier (primary key).
    pub id: String,

    pub name: String,

    pub version: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub description: String,

    /// Optional icon shown next to the plugin name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,

    /// Origin reference (usually a repository URL) used for updates.
    #[serde(default)]
    pub source_url: String,

    /// Location of the loadable binary artifact, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wasm_path: Option<String>,

    /// Outcome of the last load/run, computed by the backend.
    pub status: PluginStatus,

    /// Diagnostic text shown when the status indicates a failure.
    #[serde(default)]
    pub message: String,
}

impl Plugin {
    /// Whether the backend reports this plugin as running.
    pub fn is_active(&self) -> bool {
        self.status == PluginStatus::Active
    }
}

/// Backend-authoritative plugin status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    Active,
    Error,
    Inactive,
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Error => "error",
            Self::Inactive => "inactive",
        };
        f.write_str(s)
    }
}

/// Response of the single-plugin update check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
}

/// Plugin id → available version, returned by the bulk update check.
pub type UpdateMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
