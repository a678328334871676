//! Error types module
//!
//! Every way preview synthesis can fail is a `PreviewError` variant. None of them
//! ever reach the upload workflow: the pipeline facade logs the error and reports
//! "no preview" instead. The variants exist so that the log line says what went wrong.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("Empty input")]
    EmptyInput,

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("External tool '{tool}' is unavailable: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("External tool '{tool}' failed (code {code:?}): {output}")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        output: String,
    },

    #[error("External tool '{tool}' did not finish within {timeout:?}")]
    ToolTimedOut { tool: String, timeout: Duration },

    #[error("Expected artifact missing: {0}")]
    MissingArtifact(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Worker task failed: {0}")]
    Task(String),
}

impl PreviewError {
    /// Stable machine-readable code, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            PreviewError::EmptyInput => "empty_input",
            PreviewError::Decode(_) => "decode",
            PreviewError::Pdf(_) => "pdf",
            PreviewError::ToolUnavailable { .. } => "tool_unavailable",
            PreviewError::ToolFailed { .. } => "tool_failed",
            PreviewError::ToolTimedOut { .. } => "tool_timed_out",
            PreviewError::MissingArtifact(_) => "missing_artifact",
            PreviewError::Io(_) => "io",
            PreviewError::Task(_) => "task",
        }
    }

    pub fn tool_failed(
        tool: impl Into<String>,
        code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            code,
            output: output.into(),
        }
    }
}
