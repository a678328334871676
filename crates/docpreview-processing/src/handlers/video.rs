//! Video handler - extract one frame with ffmpeg, then decode, scale, encode

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docpreview_core::{PreviewConfig, PreviewError};

use super::raster::RasterHandler;
use super::{run_blocking, PreviewHandler};
use crate::preview::{EncodedPreview, PreviewRequest};
use crate::process::{run_tool, ProcessLauncher, ToolCommand};
use crate::workspace::{sanitize_filename, ScopedWorkspace};

const WORKSPACE_PREFIX: &str = "thumb-video-";
const FRAME_FILE_NAME: &str = "thumb.png";

pub struct VideoHandler {
    launcher: Arc<dyn ProcessLauncher>,
    ffmpeg_path: String,
    seek: String,
    frame_width: u32,
    max_width: u32,
    max_height: u32,
    timeout: Duration,
    temp_root: PathBuf,
}

impl VideoHandler {
    pub fn new(config: &PreviewConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            launcher,
            ffmpeg_path: config.ffmpeg_path.clone(),
            seek: config.video_seek_timestamp(),
            frame_width: config.video_frame_width,
            max_width: config.max_width,
            max_height: config.max_height,
            timeout: config.tool_timeout(),
            temp_root: config.temp_root.clone(),
        }
    }

    async fn extract_frame(
        &self,
        workspace: &ScopedWorkspace,
        request: &PreviewRequest<'_>,
    ) -> Result<EncodedPreview, PreviewError> {
        // Keep the source extension so ffmpeg can pick the demuxer.
        let mut input_name = sanitize_filename(request.original_filename);
        if input_name == FRAME_FILE_NAME {
            input_name = format!("input-{}", input_name);
        }
        let input = workspace
            .write_input(Some(input_name.as_str()), request.bytes)
            .await?;
        let output = workspace.join(FRAME_FILE_NAME);

        let command = ToolCommand::ffmpeg_frame(
            &self.ffmpeg_path,
            &input,
            &self.seek,
            self.frame_width,
            &output,
        );
        let exit = run_tool(self.launcher.as_ref(), &command, self.timeout).await?;

        let Some(frame) = workspace.read_if_exists(&output).await? else {
            return Err(if exit.success {
                PreviewError::MissingArtifact(output)
            } else {
                PreviewError::tool_failed(&self.ffmpeg_path, exit.code, exit.output_for_log())
            });
        };

        // ffmpeg only constrained the width; apply the full bounding box again.
        let (max_width, max_height) = (self.max_width, self.max_height);
        run_blocking(move || RasterHandler::render_bytes(&frame, max_width, max_height)).await
    }
}

#[async_trait]
impl PreviewHandler for VideoHandler {
    fn name(&self) -> &'static str {
        "video"
    }

    #[tracing::instrument(skip(self, request), fields(handler = "video", size = request.bytes.len()))]
    async fn generate(
        &self,
        request: &PreviewRequest<'_>,
    ) -> Result<EncodedPreview, PreviewError> {
        let workspace = ScopedWorkspace::create(&self.temp_root, WORKSPACE_PREFIX)?;
        let result = self.extract_frame(&workspace, request).await;
        workspace.close();
        result
    }
}
