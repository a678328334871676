//! Test helpers: isolated temp roots, pipelines wired to fake tools, fixtures.
//!
//! Run from workspace root: `cargo test -p docpreview-processing`.

#![allow(dead_code)]

pub mod fixtures;
pub mod tools;

use docpreview_processing::{PreviewConfig, PreviewPipeline, ProcessLauncher};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A pipeline whose workspaces live under a private temp root.
pub struct TestPipeline {
    pub pipeline: PreviewPipeline,
    pub root: TempDir,
}

impl TestPipeline {
    /// Entries left behind under the temp root.
    pub fn leftovers(&self) -> usize {
        count_entries(self.root.path())
    }
}

pub fn test_config(root: &Path) -> PreviewConfig {
    PreviewConfig {
        temp_root: root.to_path_buf(),
        tool_timeout_secs: 1,
        ..PreviewConfig::default()
    }
}

pub fn setup_pipeline(launcher: Arc<dyn ProcessLauncher>) -> TestPipeline {
    let root = tempfile::tempdir().expect("create temp root");
    let pipeline = PreviewPipeline::with_launcher(&test_config(root.path()), launcher);
    TestPipeline { pipeline, root }
}

pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
