//! Raster image handler - decode directly, scale, encode

use async_trait::async_trait;
use docpreview_core::PreviewError;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

use super::{run_blocking, PreviewHandler};
use crate::preview::{EncodedPreview, PreviewRequest};
use crate::scale::scale_and_encode;

pub struct RasterHandler {
    max_width: u32,
    max_height: u32,
}

impl RasterHandler {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Decode still-image bytes, sniffing the format from the content itself.
    pub fn decode(data: &[u8]) -> Result<DynamicImage, PreviewError> {
        if data.is_empty() {
            return Err(PreviewError::EmptyInput);
        }
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| PreviewError::Decode(e.to_string()))?;
        if reader.format().is_none() {
            return Err(PreviewError::Decode("unrecognized image format".to_string()));
        }
        reader
            .decode()
            .map_err(|e| PreviewError::Decode(e.to_string()))
    }

    /// Synchronous decode → scale → encode.
    pub fn render_bytes(
        data: &[u8],
        max_width: u32,
        max_height: u32,
    ) -> Result<EncodedPreview, PreviewError> {
        let img = Self::decode(data)?;
        scale_and_encode(&img, max_width, max_height)
    }
}

#[async_trait]
impl PreviewHandler for RasterHandler {
    fn name(&self) -> &'static str {
        "raster"
    }

    #[tracing::instrument(skip(self, request), fields(handler = "raster", size = request.bytes.len()))]
    async fn generate(
        &self,
        request: &PreviewRequest<'_>,
    ) -> Result<EncodedPreview, PreviewError> {
        let data = request.bytes.to_vec();
        let (max_width, max_height) = (self.max_width, self.max_height);
        run_blocking(move || Self::render_bytes(&data, max_width, max_height)).await
    }
}
