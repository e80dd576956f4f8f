//! Renderer driving an external wkhtmltopdf binary

use super::traits::{DocumentRenderer, RendererCapabilities};
use crate::error::ConversionError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Name of the binary looked up on `PATH`
pub const RENDERER_BINARY: &str = "wkhtmltopdf";

/// Renderer that runs `wkhtmltopdf --quiet --enable-local-file-access <input> <output>`
///
/// Local file access lets relative image references in the input resolve against the
/// directory the assets were downloaded into.
///
/// # Examples
///
/// ```no_run
/// use filing_dl::convert::{CliRenderer, DocumentRenderer};
/// use std::path::{Path, PathBuf};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Create with explicit path
/// let renderer = CliRenderer::new(PathBuf::from("/usr/local/bin/wkhtmltopdf"));
///
/// renderer
///     .render(Path::new("filing.htm"), Path::new("filing.pdf"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct CliRenderer {
    binary_path: PathBuf,
}

impl CliRenderer {
    /// Create a renderer with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find wkhtmltopdf in PATH
    pub fn from_path() -> Option<Self> {
        which::which(RENDERER_BINARY).ok().map(Self::new)
    }

    /// Path of the binary this renderer runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl DocumentRenderer for CliRenderer {
    async fn render(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let result = Command::new(&self.binary_path)
            .arg("--quiet")
            .arg("--enable-local-file-access")
            .arg(input)
            .arg(output)
            .output()
            .await;

        let result = match result {
            Ok(result) => result,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConversionError::RendererUnavailable {
                    reason: format!("{} not found: {}", self.binary_path.display(), e),
                });
            }
            Err(e) => {
                return Err(ConversionError::RendererFailed {
                    input: input.to_path_buf(),
                    reason: format!("failed to execute {}: {}", self.binary_path.display(), e),
                });
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ConversionError::RendererFailed {
                input: input.to_path_buf(),
                reason: format!("{} ({})", stderr.trim(), result.status),
            });
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(ConversionError::RendererFailed {
                input: input.to_path_buf(),
                reason: format!("renderer exited cleanly but wrote no {}", output.display()),
            });
        }

        Ok(())
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities {
            can_render: true,
            local_assets: true,
        }
    }

    fn name(&self) -> &'static str {
        RENDERER_BINARY
    }
}
