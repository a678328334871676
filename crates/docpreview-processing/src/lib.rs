//! Docpreview Processing Library
//!
//! This crate turns uploaded files into small PNG previews: raster images are decoded
//! directly, PDFs are rasterized through pdfium, and videos and office documents go
//! through ffmpeg and a headless office suite first. [`PreviewPipeline`] is the entry
//! point and never fails; a failed preview is simply absent.

pub mod dispatch;
pub mod handlers;
pub mod pipeline;
pub mod preview;
pub mod process;
pub mod scale;
pub mod workspace;

// Re-export commonly used types
pub use dispatch::{classify, PreviewKind};
pub use handlers::pdf::pdfium_available;
pub use handlers::{OfficeHandler, PdfHandler, PreviewHandler, RasterHandler, VideoHandler};
pub use pipeline::PreviewPipeline;
pub use preview::{EncodedPreview, PreviewRequest};
pub use process::{
    run_tool, ProcessLauncher, RunningProcess, TokioProcessLauncher, ToolCommand, ToolExit,
};
pub use workspace::ScopedWorkspace;

pub use docpreview_core::{PreviewConfig, PreviewError};
