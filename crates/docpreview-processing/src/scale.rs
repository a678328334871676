//! Bounded, aspect-preserving downscale and PNG encoding of preview rasters.

use std::io::Cursor;

use docpreview_core::PreviewError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};

use crate::preview::EncodedPreview;

/// Compute dimensions that fit `src` inside `max_width`×`max_height`.
///
/// The scale ratio is capped at 1.0 so small sources are never upscaled, and each
/// dimension is floored to 1 pixel so extreme aspect ratios never collapse to zero.
pub fn fit_within(src_width: u32, src_height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let ratio = 1.0_f64
        .min(max_width as f64 / src_width as f64)
        .min(max_height as f64 / src_height as f64);

    let width = ((src_width as f64 * ratio).round() as u32).max(1);
    let height = ((src_height as f64 * ratio).round() as u32).max(1);
    (width, height)
}

/// Select a resampling filter based on the reduction factor.
///
/// All choices interpolate smoothly; the cheaper triangle (bilinear) kernel is used for
/// heavy reductions where its wider effective support already antialiases well.
pub fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        FilterType::Triangle
    } else if max_ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}

/// Scale an image to fit the bounding box. The result is always RGBA8.
pub fn scale_to_fit(img: &DynamicImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (orig_width, orig_height) = img.dimensions();
    let (width, height) = fit_within(orig_width, orig_height, max_width, max_height);
    let rgba = img.to_rgba8();

    if (width, height) == (orig_width, orig_height) {
        return rgba;
    }

    let filter = select_filter(orig_width, orig_height, width, height);
    imageops::resize(&rgba, width, height, filter)
}

pub fn encode_png(img: &RgbaImage) -> Result<EncodedPreview, PreviewError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| PreviewError::Decode(format!("PNG encoding failed: {}", e)))?;
    Ok(EncodedPreview::new(buffer, img.width(), img.height()))
}

/// Scale and encode in one step; the shared tail of every handler.
pub fn scale_and_encode(
    img: &DynamicImage,
    max_width: u32,
    max_height: u32,
) -> Result<EncodedPreview, PreviewError> {
    encode_png(&scale_to_fit(img, max_width, max_height))
}
