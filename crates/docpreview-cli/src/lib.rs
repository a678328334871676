use docpreview_processing::EncodedPreview;
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for the CLI. Logs go to stderr so stdout only carries the result.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "docpreview=debug".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Machine-readable outcome of one preview run.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PreviewSummary {
    pub input: String,
    pub content_type: String,
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl PreviewSummary {
    pub fn new(input: &Path, content_type: &str, preview: Option<&EncodedPreview>) -> Self {
        let dimensions = preview.map(EncodedPreview::dimensions);
        Self {
            input: input.display().to_string(),
            content_type: content_type.to_string(),
            present: preview.is_some(),
            mime_type: preview.map(|_| EncodedPreview::MIME_TYPE),
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            size: preview.map(|p| p.as_bytes().len()),
        }
    }
}

/// Filename handed to the pipeline when none is given explicitly.
pub fn default_filename(input: &Path) -> Option<String> {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}
