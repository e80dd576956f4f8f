//! Traits and types for PDF rendering

use crate::error::ConversionError;
use async_trait::async_trait;
use std::path::Path;

/// Capabilities of a renderer implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererCapabilities {
    /// Can produce PDF output at all
    pub can_render: bool,
    /// Resolves relative image references against the input's directory
    pub local_assets: bool,
}

/// Renders a markup file on disk into a PDF file
///
/// Implementations either drive an external engine or stand in for a missing one.
///
/// # Examples
///
/// ```no_run
/// use filing_dl::convert::{CliRenderer, DocumentRenderer};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let renderer = CliRenderer::from_path()
///     .ok_or("wkhtmltopdf not found in PATH")?;
///
/// renderer
///     .render(Path::new("filing.htm"), Path::new("filing.pdf"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render `input` into a PDF at `output`
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::RendererFailed`] when the engine reports a failure or
    /// produces no file, and [`ConversionError::RendererUnavailable`] when there is no
    /// engine to run.
    async fn render(&self, input: &Path, output: &Path) -> Result<(), ConversionError>;

    /// Query capabilities of this renderer
    fn capabilities(&self) -> RendererCapabilities;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
