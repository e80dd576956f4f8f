//! Conversion of downloaded filings into PDF
//!
//! Rendering is delegated to a [`DocumentRenderer`]:
//!
//! - [`CliRenderer`]: runs an external `wkhtmltopdf` binary
//! - [`NoOpRenderer`]: stands in when no engine is available
//!
//! [`FormatConverter`] sits in front of the renderer. Markup goes straight through.
//! Plain text is escaped and wrapped in a minimal monospace HTML shell first. The shell
//! is written next to the input and removed again whether rendering succeeds or not.

mod cli;
mod noop;
mod traits;

pub use cli::{CliRenderer, RENDERER_BINARY};
pub use noop::NoOpRenderer;
pub use traits::{DocumentRenderer, RendererCapabilities};

use crate::config::ToolsConfig;
use crate::error::ConversionError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Pick a renderer the way external tools are discovered
///
/// An explicitly configured binary wins; otherwise `PATH` is searched when enabled;
/// otherwise the no-op renderer is used.
pub fn renderer_from_config(tools: &ToolsConfig) -> Arc<dyn DocumentRenderer> {
    let renderer: Arc<dyn DocumentRenderer> = if let Some(path) = &tools.renderer_path {
        Arc::new(CliRenderer::new(path.clone()))
    } else if tools.search_path {
        CliRenderer::from_path()
            .map(|r| Arc::new(r) as Arc<dyn DocumentRenderer>)
            .unwrap_or_else(|| Arc::new(NoOpRenderer))
    } else {
        Arc::new(NoOpRenderer)
    };

    let caps = renderer.capabilities();
    info!(
        renderer = renderer.name(),
        can_render = caps.can_render,
        local_assets = caps.local_assets,
        "Renderer initialized"
    );

    renderer
}

/// Converts markup or plain-text documents to PDF
#[derive(Clone)]
pub struct FormatConverter {
    renderer: Arc<dyn DocumentRenderer>,
}

impl FormatConverter {
    /// Create a converter backed by `renderer`
    pub fn new(renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self { renderer }
    }

    /// The renderer in use
    pub fn renderer(&self) -> &Arc<dyn DocumentRenderer> {
        &self.renderer
    }

    /// Convert `input` to a PDF at `output` and return the output path
    ///
    /// A partially written `output` is left in place when rendering fails.
    ///
    /// # Errors
    ///
    /// [`ConversionError::InputUnreadable`] if the input is missing or unreadable,
    /// [`ConversionError::Io`] if the text shell cannot be written, or whatever the
    /// renderer reports.
    pub async fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, ConversionError> {
        tokio::fs::metadata(input)
            .await
            .map_err(|source| ConversionError::InputUnreadable {
                path: input.to_path_buf(),
                source,
            })?;

        if is_plain_text(input) {
            let bytes = tokio::fs::read(input)
                .await
                .map_err(|source| ConversionError::InputUnreadable {
                    path: input.to_path_buf(),
                    source,
                })?;
            let shell = text_shell(&String::from_utf8_lossy(&bytes));

            let shell_path = shell_path(input);
            let _guard = RemoveOnDrop(shell_path.clone());
            tokio::fs::write(&shell_path, shell)
                .await
                .map_err(|source| ConversionError::Io {
                    path: shell_path.clone(),
                    source,
                })?;

            debug!(input = %input.display(), "wrapped plain text in HTML shell");
            self.renderer.render(&shell_path, output).await?;
        } else {
            self.renderer.render(input, output).await?;
        }

        info!(output = %output.display(), renderer = self.renderer.name(), "converted to PDF");
        Ok(output.to_path_buf())
    }
}

/// Deletes a temporary file when dropped
struct RemoveOnDrop(PathBuf);

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.0.display(), error = %e, "failed to remove temporary file");
            }
            _ => {}
        }
    }
}

/// `<name>.shell.html` next to the input, so an existing `<stem>.html` is never touched
fn shell_path(input: &Path) -> PathBuf {
    let mut name = input.file_name().unwrap_or_default().to_os_string();
    name.push(".shell.html");
    input.with_file_name(name)
}

fn is_plain_text(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// Escape the characters that are significant in HTML text and attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn text_shell(text: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>\n",
            "pre {{ font-family: 'Courier New', monospace; font-size: 10pt; ",
            "white-space: pre-wrap; word-wrap: break-word; }}\n",
            "body {{ margin: 20px; }}\n",
            "</style>\n</head>\n<body>\n<pre>{}</pre>\n</body>\n</html>\n"
        ),
        escape_html(text)
    )
}
