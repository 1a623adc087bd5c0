//! CLI entry point for the OpenList plugin console.
//!
//! Each subcommand performs one action of the plugin management page and
//! reports the outcome through the same notifications the page would show.

mod cli;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use openlist_admin::{
    AdminConfig, HttpAssetFetcher, PluginConsole, Preview, PreviewState, Viewport,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use output::{ConsoleNotifier, SummaryRendererFactory, plugin_table};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(if cli.verbose { "debug" } else { "warn" });

    if let Err(e) = run(cli).await {
        error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::List => cmd_list(&config).await,
        Commands::Check { id } => cmd_check(&config, id.as_deref()).await,
        Commands::Update { id } => cmd_update(&config, &id).await,
        Commands::Uninstall { id } => cmd_uninstall(&config, &id).await,
        Commands::Install { source } => cmd_install(&config, source).await,
        Commands::Upload { file } => cmd_upload(&config, file).await,
        Commands::Preview { url, width, height } => {
            cmd_preview(&config, &url, Viewport::new(width, height)).await
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

async fn cmd_list(config: &AdminConfig) -> Result<()> {
    let console = connect(config)?;
    console.open().await.context("failed to load plugins")?;
    print!("{}", plugin_table(&console.registry().plugins()));
    Ok(())
}

async fn cmd_check(config: &AdminConfig, id: Option<&str>) -> Result<()> {
    let console = connect(config)?;
    match id {
        Some(id) => {
            console
                .plugins()
                .check_update(id)
                .await
                .with_context(|| format!("update check for `{id}` failed"))?;
        }
        None => {
            let updates = console
                .plugins()
                .check_all_updates()
                .await
                .context("update check failed")?;
            for (id, version) in &updates {
                println!("      {id} -> {version}");
            }
        }
    }
    Ok(())
}

async fn cmd_update(config: &AdminConfig, id: &str) -> Result<()> {
    let console = connect(config)?;
    console
        .plugins()
        .update_plugin(id)
        .await
        .with_context(|| format!("failed to update `{id}`"))?;
    print!("{}", plugin_table(&console.registry().plugins()));
    Ok(())
}

async fn cmd_uninstall(config: &AdminConfig, id: &str) -> Result<()> {
    let console = connect(config)?;
    console
        .plugins()
        .uninstall_plugin(id)
        .await
        .with_context(|| format!("failed to uninstall `{id}`"))?;
    Ok(())
}

async fn cmd_install(config: &AdminConfig, source: String) -> Result<()> {
    let console = connect(config)?;
    let installer = console.installer();
    installer.open_dialog();
    installer.set_source(source);
    installer
        .submit_install()
        .await
        .context("failed to install plugin")?;
    print!("{}", plugin_table(&console.registry().plugins()));
    Ok(())
}

async fn cmd_upload(config: &AdminConfig, file: std::path::PathBuf) -> Result<()> {
    let console = connect(config)?;
    let installer = console.installer();
    installer
        .picker()
        .select(&file)
        .with_context(|| format!("cannot select `{}`", file.display()))?;
    installer
        .upload_selected()
        .await
        .context("failed to upload plugin")?;
    print!("{}", plugin_table(&console.registry().plugins()));
    Ok(())
}

async fn cmd_preview(config: &AdminConfig, url: &str, viewport: Viewport) -> Result<()> {
    let fetcher = HttpAssetFetcher::new(config).context("failed to build HTTP client")?;
    let preview = Preview::mount(
        &viewport,
        &SummaryRendererFactory,
        &fetcher,
        url,
        &ConsoleNotifier,
    )
    .await
    .context("failed to mount preview")?;

    let failed = match preview.state() {
        PreviewState::Failed(reason) => Some(reason.clone()),
        _ => None,
    };
    preview.unmount();

    match failed {
        Some(reason) => Err(anyhow::anyhow!("preview failed: {reason}")),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load the layered config and apply command-line overrides on top.
fn load_config(cli: &Cli) -> Result<AdminConfig> {
    let mut config =
        AdminConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(url) = &cli.url {
        config.base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn connect(config: &AdminConfig) -> Result<PluginConsole> {
    PluginConsole::connect(config, Arc::new(ConsoleNotifier))
        .context("failed to create plugin console")
}

/// Initialize the tracing subscriber with the given default log level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
