//! CLI argument definitions for the OpenList plugin console.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// OpenList plugin administration.
#[derive(Parser)]
#[command(
    name = "openlist-admin",
    version,
    about = "Manage OpenList plugins from the command line",
    long_about = "List, install, update, uninstall and upload plugins on an OpenList \
                  server, and preview presentation documents it serves."
)]
pub struct Cli {
    /// Config file to read (defaults to config/default.toml if present).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, e.g. http://127.0.0.1:5244/api.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Admin token sent as the Authorization header.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Enable debug logging.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List installed plugins.
    List,

    /// Check for updates: one plugin if ID is given, otherwise all.
    Check {
        /// Plugin id.
        id: Option<String>,
    },

    /// Update a plugin from its source.
    Update {
        /// Plugin id.
        id: String,
    },

    /// Uninstall a plugin.
    Uninstall {
        /// Plugin id.
        id: String,
    },

    /// Install a plugin from a source reference.
    Install {
        /// Repository URL or other source the server understands.
        source: String,
    },

    /// Upload a plugin package.
    Upload {
        /// Path to the package file.
        file: PathBuf,
    },

    /// Fetch a document and render it with the summary renderer.
    Preview {
        /// URL of the document.
        url: String,

        /// Viewport width in pixels.
        #[arg(long, default_value_t = 1280)]
        width: u32,

        /// Viewport height in pixels.
        #[arg(long, default_value_t = 720)]
        height: u32,
    },
}
