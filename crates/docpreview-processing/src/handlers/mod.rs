//! Per-format preview strategies
//!
//! Each handler turns one upload into a PNG preview or fails with a [`PreviewError`]
//! naming the cause. Handlers do not decide what a failure means for the upload; the
//! pipeline facade does.

pub mod office;
pub mod pdf;
pub mod raster;
pub mod video;

pub use office::OfficeHandler;
pub use pdf::PdfHandler;
pub use raster::RasterHandler;
pub use video::VideoHandler;

use async_trait::async_trait;
use docpreview_core::PreviewError;

use crate::preview::{EncodedPreview, PreviewRequest};

/// A per-format preview strategy.
#[async_trait]
pub trait PreviewHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        request: &PreviewRequest<'_>,
    ) -> Result<EncodedPreview, PreviewError>;
}

/// Run CPU-bound decode/render work off the async runtime.
///
/// A panic inside `work` is reported as [`PreviewError::Task`] instead of unwinding
/// into the caller.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, PreviewError>
where
    F: FnOnce() -> Result<T, PreviewError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PreviewError::Task(format!("spawn_blocking for preview work: {}", e)))?
}
