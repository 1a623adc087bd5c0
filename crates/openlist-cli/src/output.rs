//! Terminal rendering: notifications, the plugin table and the preview
//! summary renderer.

use async_trait::async_trait;
use openlist_admin::{
    AdminError, Level, Notification, Notifier, Plugin, Renderer, RendererFactory, Viewport,
};

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Prints each notification as one marked line; failures go to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let line = format!("  {} {notification}", marker(notification.level));
        match notification.level {
            Level::Error | Level::Warning => eprintln!("{line}"),
            Level::Success | Level::Info => println!("{line}"),
        }
    }
}

fn marker(level: Level) -> &'static str {
    match level {
        Level::Success => "[+]",
        Level::Info => "[i]",
        Level::Warning => "[!]",
        Level::Error => "[x]",
    }
}

// ---------------------------------------------------------------------------
// Plugin table
// ---------------------------------------------------------------------------

/// Format the registry as an aligned table, one plugin per row, with the
/// diagnostic message indented beneath any plugin that has one.
pub fn plugin_table(plugins: &[Plugin]) -> String {
    if plugins.is_empty() {
        return "  No plugins installed.\n".to_owned();
    }

    let id_w = column_width(plugins.iter().map(|p| p.id.as_str()), "ID");
    let name_w = column_width(plugins.iter().map(|p| p.name.as_str()), "NAME");
    let ver_w = column_width(plugins.iter().map(|p| p.version.as_str()), "VERSION");

    let mut out = format!(
        "  {:id_w$}  {:name_w$}  {:ver_w$}  {:8}  AUTHOR\n",
        "ID", "NAME", "VERSION", "STATUS"
    );
    for p in plugins {
        out.push_str(&format!(
            "  {:id_w$}  {:name_w$}  {:ver_w$}  {:8}  {}\n",
            p.id,
            p.name,
            p.version,
            p.status.to_string(),
            p.author
        ));
        if !p.message.is_empty() {
            for line in p.message.lines() {
                out.push_str(&format!("      {line}\n"));
            }
        }
    }
    out
}

/// Widths count chars, matching how `format!` pads.
fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .chain([header.chars().count()])
        .max()
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Preview renderer
// ---------------------------------------------------------------------------

/// Renderer that describes a document instead of drawing it.
#[derive(Debug)]
pub struct SummaryRenderer {
    viewport: Viewport,
}

#[async_trait]
impl Renderer for SummaryRenderer {
    async fn preview(&mut self, bytes: Vec<u8>) -> openlist_admin::Result<()> {
        if bytes.is_empty() {
            return Err(AdminError::Render("document is empty".into()));
        }
        println!(
            "  {} ({} bytes) at {}x{}",
            describe(&bytes),
            bytes.len(),
            self.viewport.width,
            self.viewport.height
        );
        Ok(())
    }

    fn dispose(&mut self) {
        tracing::debug!("summary renderer released");
    }
}

/// Creates [`SummaryRenderer`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryRendererFactory;

impl RendererFactory for SummaryRendererFactory {
    fn init(&self, viewport: Viewport) -> openlist_admin::Result<Box<dyn Renderer>> {
        Ok(Box::new(SummaryRenderer { viewport }))
    }
}

/// Name the container format from its magic bytes.
pub fn describe(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"PK\x03\x04") {
        "Office Open XML package"
    } else if bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
        "legacy Office document"
    } else if bytes.starts_with(b"%PDF") {
        "PDF document"
    } else {
        "unrecognised document"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
