//! Renderer used when no PDF engine is available

use super::traits::{DocumentRenderer, RendererCapabilities};
use crate::error::ConversionError;
use async_trait::async_trait;
use std::path::Path;

/// Renderer that always fails with [`ConversionError::RendererUnavailable`]
///
/// Selected when no binary is configured and none is found on `PATH`, so the rest of
/// the pipeline still runs and every company reports a conversion failure.
///
/// ```
/// use filing_dl::convert::{DocumentRenderer, NoOpRenderer};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() {
/// let result = NoOpRenderer
///     .render(Path::new("filing.htm"), Path::new("filing.pdf"))
///     .await;
/// assert!(result.is_err());
/// # }
/// ```
pub struct NoOpRenderer;

#[async_trait]
impl DocumentRenderer for NoOpRenderer {
    async fn render(&self, _input: &Path, _output: &Path) -> Result<(), ConversionError> {
        Err(ConversionError::RendererUnavailable {
            reason: "PDF rendering requires the wkhtmltopdf binary. \
                     Configure tools.renderer_path or ensure wkhtmltopdf is in PATH."
                .into(),
        })
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities {
            can_render: false,
            local_assets: false,
        }
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
