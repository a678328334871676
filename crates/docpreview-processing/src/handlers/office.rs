//! Office document handler - convert to PDF with a headless office suite, then render as PDF

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docpreview_core::{PreviewConfig, PreviewError};

use super::pdf::PdfHandler;
use super::PreviewHandler;
use crate::preview::{EncodedPreview, PreviewRequest};
use crate::process::{run_tool, ProcessLauncher, ToolCommand};
use crate::workspace::{replace_extension, sanitize_filename, ScopedWorkspace};

const WORKSPACE_PREFIX: &str = "thumb-office-";

pub struct OfficeHandler {
    launcher: Arc<dyn ProcessLauncher>,
    converter_path: String,
    timeout: Duration,
    temp_root: PathBuf,
    pdf: PdfHandler,
}

impl OfficeHandler {
    pub fn new(
        config: &PreviewConfig,
        launcher: Arc<dyn ProcessLauncher>,
        pdf: PdfHandler,
    ) -> Self {
        Self {
            launcher,
            converter_path: config.office_converter_path.clone(),
            timeout: config.tool_timeout(),
            temp_root: config.temp_root.clone(),
            pdf,
        }
    }

    /// Input and expected output names inside the workspace. The two never coincide,
    /// even when the upload already carries a `.pdf` extension.
    pub fn conversion_names(original_filename: Option<&str>) -> (String, String) {
        let mut input_name = sanitize_filename(original_filename);
        if replace_extension(&input_name, "pdf") == input_name {
            input_name = format!("{}.bin", input_name);
        }
        let converted_name = replace_extension(&input_name, "pdf");
        (input_name, converted_name)
    }

    async fn convert_and_render(
        &self,
        workspace: &ScopedWorkspace,
        request: &PreviewRequest<'_>,
    ) -> Result<EncodedPreview, PreviewError> {
        let (input_name, converted_name) = Self::conversion_names(request.original_filename);
        let input = workspace
            .write_input(Some(input_name.as_str()), request.bytes)
            .await?;
        let converted = workspace.join(&converted_name);

        let command = ToolCommand::office_to_pdf(&self.converter_path, workspace.path(), &input);
        let exit = run_tool(self.launcher.as_ref(), &command, self.timeout).await?;

        let Some(pdf_bytes) = workspace.read_if_exists(&converted).await? else {
            return Err(if exit.success {
                PreviewError::MissingArtifact(converted)
            } else {
                PreviewError::tool_failed(&self.converter_path, exit.code, exit.output_for_log())
            });
        };

        tracing::debug!(
            converted = %converted.display(),
            size = pdf_bytes.len(),
            "Office document converted to PDF"
        );
        self.pdf.render_owned(pdf_bytes).await
    }
}

#[async_trait]
impl PreviewHandler for OfficeHandler {
    fn name(&self) -> &'static str {
        "office"
    }

    #[tracing::instrument(skip(self, request), fields(handler = "office", size = request.bytes.len()))]
    async fn generate(
        &self,
        request: &PreviewRequest<'_>,
    ) -> Result<EncodedPreview, PreviewError> {
        let workspace = ScopedWorkspace::create(&self.temp_root, WORKSPACE_PREFIX)?;
        let result = self.convert_and_render(&workspace, request).await;
        workspace.close();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_names() {
        assert_eq!(
            OfficeHandler::conversion_names(Some("Budget 2024.xlsx")),
            ("Budget_2024.xlsx".to_string(), "Budget_2024.pdf".to_string())
        );
        assert_eq!(
            OfficeHandler::conversion_names(Some("notes")),
            ("notes".to_string(), "notes.pdf".to_string())
        );
    }

    #[test]
    fn test_conversion_names_never_collide() {
        let (input, converted) = OfficeHandler::conversion_names(Some("already.pdf"));
        assert_eq!(input, "already.pdf.bin");
        assert_eq!(converted, "already.pdf.pdf");
        assert_ne!(input, converted);
    }

    #[test]
    fn test_conversion_names_without_filename() {
        let (input, converted) = OfficeHandler::conversion_names(None);
        assert!(input.ends_with(".bin"));
        assert_eq!(converted, replace_extension(&input, "pdf"));
    }
}
