//! docpreview - generate a bounded PNG preview for a local file.
//!
//! Configuration comes from the environment (see `PreviewConfig::from_env`).

use anyhow::Context;
use clap::Parser;
use docpreview_cli::{default_filename, init_tracing, PreviewSummary};
use docpreview_core::PreviewConfig;
use docpreview_processing::PreviewPipeline;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docpreview", about = "Generate a PNG preview for a document")]
struct Cli {
    /// File to preview
    input: PathBuf,
    /// Declared MIME type, e.g. image/png, application/pdf, video/mp4
    #[arg(long)]
    content_type: String,
    /// Original filename (defaults to the input's file name)
    #[arg(long)]
    filename: Option<String>,
    /// Write the PNG here
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Print the preview as base64 on stdout
    #[arg(long)]
    base64: bool,
    /// Print a JSON summary on stdout
    #[arg(long, conflicts_with = "base64")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = PreviewConfig::from_env().context("Invalid preview configuration")?;
    let bytes = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let filename = cli.filename.clone().or_else(|| default_filename(&cli.input));

    let pipeline = PreviewPipeline::new(&config);
    let preview = pipeline
        .generate_preview(&bytes, Some(&cli.content_type), filename.as_deref())
        .await;

    if let (Some(preview), Some(output)) = (&preview, &cli.output) {
        tokio::fs::write(output, preview.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;
        tracing::info!(output = %output.display(), "Preview written");
    }

    if cli.json {
        let summary = PreviewSummary::new(&cli.input, &cli.content_type, preview.as_ref());
        let out = serde_json::to_string_pretty(&summary).context("Serialize summary")?;
        println!("{}", out);
        return Ok(());
    }

    match preview {
        Some(preview) if cli.base64 => println!("{}", preview.to_base64()),
        Some(preview) => {
            let (width, height) = preview.dimensions();
            println!("preview {}x{} ({} bytes)", width, height, preview.as_bytes().len());
        }
        // Absence is a normal outcome.
        None => println!("no preview"),
    }

    Ok(())
}
