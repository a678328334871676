//! Configuration module
//!
//! This module provides the preview pipeline configuration: raster bounds, the
//! rasterization density for PDFs, the external tool locations and the upper bound
//! on how long an external tool may run.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Defaults
const MAX_WIDTH: u32 = 480;
const MAX_HEIGHT: u32 = 320;
const PDF_RENDER_DPI: u32 = 220;
const VIDEO_SEEK_SECONDS: u32 = 1;
const VIDEO_FRAME_WIDTH: u32 = 480;
const TOOL_TIMEOUT_SECS: u64 = 60;

/// Characters that must never appear in a tool path handed to the process launcher.
const DANGEROUS_PATH_CHARS: [char; 11] = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];

/// Preview pipeline configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub pdf_render_dpi: u32,
    pub video_seek_seconds: u32,
    pub video_frame_width: u32,
    pub ffmpeg_path: String,
    pub office_converter_path: String,
    pub tool_timeout_secs: u64,
    /// Parent directory for scoped workspaces. Defaults to the OS temp dir.
    pub temp_root: PathBuf,
    /// Directory holding the pdfium shared library. `None` binds the system library.
    pub pdfium_library_dir: Option<PathBuf>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_width: MAX_WIDTH,
            max_height: MAX_HEIGHT,
            pdf_render_dpi: PDF_RENDER_DPI,
            video_seek_seconds: VIDEO_SEEK_SECONDS,
            video_frame_width: VIDEO_FRAME_WIDTH,
            ffmpeg_path: "ffmpeg".to_string(),
            office_converter_path: "libreoffice".to_string(),
            tool_timeout_secs: TOOL_TIMEOUT_SECS,
            temp_root: env::temp_dir(),
            pdfium_library_dir: None,
        }
    }
}

impl PreviewConfig {
    /// Load configuration from the process environment (and `.env` when present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // A missing .env file is the normal case in production
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Unset or unparsable numeric values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = PreviewConfig {
            max_width: lookup("PREVIEW_MAX_WIDTH")
                .unwrap_or_else(|| MAX_WIDTH.to_string())
                .parse()
                .unwrap_or(MAX_WIDTH),
            max_height: lookup("PREVIEW_MAX_HEIGHT")
                .unwrap_or_else(|| MAX_HEIGHT.to_string())
                .parse()
                .unwrap_or(MAX_HEIGHT),
            pdf_render_dpi: lookup("PREVIEW_PDF_DPI")
                .unwrap_or_else(|| PDF_RENDER_DPI.to_string())
                .parse()
                .unwrap_or(PDF_RENDER_DPI),
            video_seek_seconds: lookup("PREVIEW_VIDEO_SEEK_SECONDS")
                .unwrap_or_else(|| VIDEO_SEEK_SECONDS.to_string())
                .parse()
                .unwrap_or(VIDEO_SEEK_SECONDS),
            video_frame_width: lookup("PREVIEW_VIDEO_FRAME_WIDTH")
                .unwrap_or_else(|| VIDEO_FRAME_WIDTH.to_string())
                .parse()
                .unwrap_or(VIDEO_FRAME_WIDTH),
            ffmpeg_path: lookup("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            office_converter_path: lookup("OFFICE_CONVERTER_PATH")
                .unwrap_or(defaults.office_converter_path),
            tool_timeout_secs: lookup("PREVIEW_TOOL_TIMEOUT_SECS")
                .unwrap_or_else(|| TOOL_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TOOL_TIMEOUT_SECS),
            temp_root: lookup("PREVIEW_TEMP_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_root),
            pdfium_library_dir: lookup("PDFIUM_LIBRARY_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(anyhow::anyhow!(
                "Preview bounds must be non-zero (got {}x{})",
                self.max_width,
                self.max_height
            ));
        }
        if self.pdf_render_dpi == 0 {
            return Err(anyhow::anyhow!("PREVIEW_PDF_DPI must be greater than 0"));
        }
        if self.video_frame_width == 0 {
            return Err(anyhow::anyhow!(
                "PREVIEW_VIDEO_FRAME_WIDTH must be greater than 0"
            ));
        }
        if self.tool_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "PREVIEW_TOOL_TIMEOUT_SECS must be greater than 0"
            ));
        }
        validate_tool_path("FFMPEG_PATH", &self.ffmpeg_path)?;
        validate_tool_path("OFFICE_CONVERTER_PATH", &self.office_converter_path)?;
        Ok(())
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Seek offset for frame extraction in ffmpeg's `HH:MM:SS` form.
    pub fn video_seek_timestamp(&self) -> String {
        let total = self.video_seek_seconds;
        format!(
            "{:02}:{:02}:{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }
}

fn validate_tool_path(name: &str, path: &str) -> Result<(), anyhow::Error> {
    if path.trim().is_empty() {
        return Err(anyhow::anyhow!("{} must not be empty", name));
    }
    if path.chars().any(|c| DANGEROUS_PATH_CHARS.contains(&c)) {
        return Err(anyhow::anyhow!(
            "Invalid {}: contains dangerous characters",
            name
        ));
    }
    Ok(())
}
