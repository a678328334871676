//! Preview pipeline facade
//!
//! [`PreviewPipeline`] is the only entry point the upload workflow uses. It classifies the
//! declared content type, runs the matching handler and reduces the outcome to an optional
//! preview. Handler errors are logged here and never returned.

use std::sync::Arc;

use docpreview_core::PreviewConfig;

use crate::dispatch::{classify, PreviewKind};
use crate::handlers::{OfficeHandler, PdfHandler, PreviewHandler, RasterHandler, VideoHandler};
use crate::preview::{EncodedPreview, PreviewRequest};
use crate::process::{ProcessLauncher, TokioProcessLauncher};

pub struct PreviewPipeline {
    raster: RasterHandler,
    pdf: PdfHandler,
    video: VideoHandler,
    office: OfficeHandler,
}

impl PreviewPipeline {
    /// Pipeline that runs external tools as real child processes.
    pub fn new(config: &PreviewConfig) -> Self {
        Self::with_launcher(config, Arc::new(TokioProcessLauncher))
    }

    /// Pipeline with a caller-supplied process backend.
    pub fn with_launcher(config: &PreviewConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        let pdf = PdfHandler::new(
            config.max_width,
            config.max_height,
            config.pdf_render_dpi,
            config.pdfium_library_dir.clone(),
        );
        Self {
            raster: RasterHandler::new(config.max_width, config.max_height),
            video: VideoHandler::new(config, launcher.clone()),
            office: OfficeHandler::new(config, launcher, pdf.clone()),
            pdf,
        }
    }

    fn handler_for(&self, kind: PreviewKind) -> &dyn PreviewHandler {
        match kind {
            PreviewKind::RasterImage => &self.raster,
            PreviewKind::Pdf => &self.pdf,
            PreviewKind::Video => &self.video,
            PreviewKind::OfficeDocument => &self.office,
        }
    }

    /// Best-effort preview for one upload. Absence is a normal outcome, never an error.
    pub async fn generate_preview(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
        original_filename: Option<&str>,
    ) -> Option<EncodedPreview> {
        self.generate(&PreviewRequest::new(bytes, content_type, original_filename))
            .await
    }

    pub async fn generate(&self, request: &PreviewRequest<'_>) -> Option<EncodedPreview> {
        if request.bytes.is_empty() {
            tracing::debug!(content_type = ?request.content_type, "Empty upload, no preview");
            return None;
        }

        let Some(kind) = classify(request.content_type) else {
            tracing::debug!(
                content_type = ?request.content_type,
                "No preview handler for content type"
            );
            return None;
        };

        let handler = self.handler_for(kind);
        match handler.generate(request).await {
            Ok(preview) => {
                let (width, height) = preview.dimensions();
                tracing::info!(
                    handler = handler.name(),
                    content_type = ?request.content_type,
                    width,
                    height,
                    size = preview.as_bytes().len(),
                    "Preview generated"
                );
                Some(preview)
            }
            Err(e) => {
                tracing::warn!(
                    handler = handler.name(),
                    content_type = ?request.content_type,
                    error_kind = e.kind(),
                    error = %e,
                    "Preview generation failed, continuing without preview"
                );
                None
            }
        }
    }
}
