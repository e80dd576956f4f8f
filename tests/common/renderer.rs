//! Renderer double that never shells out

use async_trait::async_trait;
use filing_dl::convert::{DocumentRenderer, RendererCapabilities};
use filing_dl::error::ConversionError;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Bytes written for every successful render
pub const FAKE_PDF: &[u8] = b"%PDF-1.4\n% fake\n";

/// One render call: the input path and the markup it contained at the time
#[derive(Clone, Debug)]
pub struct RenderCall {
    pub input: PathBuf,
    pub markup: String,
}

/// Writes [`FAKE_PDF`] to the output, or fails when the output name contains a marker
#[derive(Default)]
pub struct FakeRenderer {
    fail_marker: Option<String>,
    calls: Mutex<Vec<RenderCall>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every render whose output file name contains `marker`
    pub fn failing_for(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentRenderer for FakeRenderer {
    async fn render(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let markup = std::fs::read_to_string(input).unwrap_or_default();
        self.calls.lock().unwrap().push(RenderCall {
            input: input.to_path_buf(),
            markup,
        });

        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(marker) = &self.fail_marker {
            if name.contains(marker.as_str()) {
                return Err(ConversionError::RendererFailed {
                    input: input.to_path_buf(),
                    reason: format!("simulated failure for {name}"),
                });
            }
        }

        std::fs::write(output, FAKE_PDF).map_err(|source| ConversionError::Io {
            path: output.to_path_buf(),
            source,
        })
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities {
            can_render: true,
            local_assets: true,
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
