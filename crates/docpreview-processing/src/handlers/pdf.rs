//! PDF handler - rasterize the first page through pdfium, scale, encode

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docpreview_core::PreviewError;

use super::{run_blocking, PreviewHandler};
use crate::preview::{EncodedPreview, PreviewRequest};

/// PDF user space is measured in points, 72 to the inch.
const POINTS_PER_INCH: f32 = 72.0;

/// The rendered page may exceed the preview bounds by at most this factor per side.
/// Oversized pages (up to 14400pt, more with `/UserUnit`) would otherwise need a
/// multi-gigabyte bitmap before the downscale.
const RENDER_OVERSAMPLE: u32 = 8;

#[derive(Clone)]
pub struct PdfHandler {
    max_width: u32,
    max_height: u32,
    dpi: u32,
    library_dir: Option<PathBuf>,
}

impl PdfHandler {
    pub fn new(max_width: u32, max_height: u32, dpi: u32, library_dir: Option<PathBuf>) -> Self {
        Self {
            max_width,
            max_height,
            dpi,
            library_dir,
        }
    }

    pub fn render_scale(dpi: u32) -> f32 {
        dpi as f32 / POINTS_PER_INCH
    }

    /// Largest bitmap pdfium is allowed to produce for one page.
    pub fn render_limits(&self) -> (u32, u32) {
        let cap = i32::MAX as u32;
        (
            self.max_width.saturating_mul(RENDER_OVERSAMPLE).min(cap),
            self.max_height.saturating_mul(RENDER_OVERSAMPLE).min(cap),
        )
    }

    /// Render page 0 of an in-memory PDF and encode it as a bounded preview.
    pub fn render_bytes(&self, data: &[u8]) -> Result<EncodedPreview, PreviewError> {
        if data.is_empty() {
            return Err(PreviewError::EmptyInput);
        }
        let page = render_first_page(
            data,
            self.dpi,
            self.render_limits(),
            self.library_dir.as_deref(),
        )?;
        crate::scale::scale_and_encode(&page, self.max_width, self.max_height)
    }

    /// Async wrapper around [`PdfHandler::render_bytes`] for callers that already own the bytes.
    pub async fn render_owned(&self, data: Vec<u8>) -> Result<EncodedPreview, PreviewError> {
        let handler = self.clone();
        run_blocking(move || handler.render_bytes(&data)).await
    }
}

#[async_trait]
impl PreviewHandler for PdfHandler {
    fn name(&self) -> &'static str {
        "pdf"
    }

    #[tracing::instrument(skip(self, request), fields(handler = "pdf", size = request.bytes.len()))]
    async fn generate(
        &self,
        request: &PreviewRequest<'_>,
    ) -> Result<EncodedPreview, PreviewError> {
        self.render_owned(request.bytes.to_vec()).await
    }
}

#[cfg(feature = "pdf")]
mod render {
    use std::path::Path;
    use std::sync::Mutex;

    use docpreview_core::PreviewError;
    use image::{DynamicImage, RgbaImage};
    use pdfium_render::prelude::*;

    use super::PdfHandler;

    /// pdfium is not re-entrant. Library binding, document parsing and rendering are
    /// serialized process-wide; the lock guards no data.
    static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

    fn pdf_error(context: &str, err: PdfiumError) -> PreviewError {
        PreviewError::Pdf(format!("{}: {:?}", context, err))
    }

    fn bind(library_dir: Option<&Path>) -> Result<Pdfium, PreviewError> {
        let bindings = match library_dir {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                .or_else(|_| Pdfium::bind_to_system_library()),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| pdf_error("pdfium library unavailable", e))?;
        Ok(Pdfium::new(bindings))
    }

    pub(super) fn bind_probe(library_dir: Option<&Path>) -> bool {
        let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        bind(library_dir).is_ok()
    }

    pub(super) fn render_first_page(
        data: &[u8],
        dpi: u32,
        (max_width, max_height): (u32, u32),
        library_dir: Option<&Path>,
    ) -> Result<DynamicImage, PreviewError> {
        let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let pdfium = bind(library_dir)?;
        // The document handle is released when it goes out of scope, on every path.
        let document = pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|e| pdf_error("failed to open document", e))?;

        let pages = document.pages();
        if pages.len() == 0 {
            return Err(PreviewError::Pdf("document has no pages".to_string()));
        }
        let page = pages
            .get(0)
            .map_err(|e| pdf_error("failed to load first page", e))?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(PdfHandler::render_scale(dpi))
            .set_maximum_width(i32::try_from(max_width).unwrap_or(i32::MAX))
            .set_maximum_height(i32::try_from(max_height).unwrap_or(i32::MAX));
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| pdf_error("failed to render first page", e))?;

        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        let raster = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
            PreviewError::Pdf(format!("rendered bitmap has unexpected size {}x{}", width, height))
        })?;

        tracing::debug!(width, height, dpi, "Rendered PDF page 0");
        Ok(DynamicImage::ImageRgba8(raster))
    }
}

#[cfg(feature = "pdf")]
use render::render_first_page;

#[cfg(not(feature = "pdf"))]
fn render_first_page(
    _data: &[u8],
    _dpi: u32,
    _limits: (u32, u32),
    _library_dir: Option<&Path>,
) -> Result<image::DynamicImage, PreviewError> {
    Err(PreviewError::Pdf(
        "PDF rendering requires the `pdf` feature".to_string(),
    ))
}

/// True when a pdfium library can be bound, so callers can tell why PDF previews are absent.
pub fn pdfium_available(library_dir: Option<&Path>) -> bool {
    #[cfg(feature = "pdf")]
    {
        render::bind_probe(library_dir)
    }
    #[cfg(not(feature = "pdf"))]
    {
        let _ = library_dir;
        false
    }
}
