//! Fake external tools for driving the video and office handlers without ffmpeg or
//! libreoffice installed.

use async_trait::async_trait;
use docpreview_processing::workspace::replace_extension;
use docpreview_processing::{PreviewError, ProcessLauncher, RunningProcess, ToolCommand, ToolExit};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a fake tool does when started.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Spawning fails as if the binary were not installed.
    Unavailable,
    /// Exits non-zero without producing anything.
    Fails { code: i32, output: String },
    /// Never exits on its own.
    Hangs,
    /// Exits zero without producing anything.
    SucceedsWithoutOutput,
    /// Writes these bytes where the real tool would write its artifact, then exits zero.
    Produces(Vec<u8>),
}

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub command: ToolCommand,
    pub input: PathBuf,
    /// Size of the input file at start time, `None` if it was missing.
    pub input_len: Option<u64>,
}

impl Call {
    pub fn workspace(&self) -> PathBuf {
        self.input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

pub struct FakeLauncher {
    behavior: Behavior,
    delay: Duration,
    calls: Mutex<Vec<Call>>,
    kills: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Self::with_delay(behavior, Duration::ZERO)
    }

    /// Sleep before acting, so concurrent calls overlap.
    pub fn with_delay(behavior: Behavior, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            delay,
            calls: Mutex::new(Vec::new()),
            kills: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

/// The input file a command reads.
pub fn input_path(command: &ToolCommand) -> PathBuf {
    if is_office_conversion(command) {
        return PathBuf::from(command.args.last().cloned().unwrap_or_default());
    }
    let position = command.args.iter().position(|a| a == "-i");
    position
        .and_then(|i| command.args.get(i + 1))
        .map(PathBuf::from)
        .unwrap_or_default()
}

/// Where the real tool would write its artifact.
pub fn artifact_path(command: &ToolCommand) -> PathBuf {
    if is_office_conversion(command) {
        let outdir = command
            .args
            .iter()
            .position(|a| a == "--outdir")
            .and_then(|i| command.args.get(i + 1))
            .map(PathBuf::from)
            .unwrap_or_default();
        let input = input_path(command);
        let name = input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        return outdir.join(replace_extension(name, "pdf"));
    }
    PathBuf::from(command.args.last().cloned().unwrap_or_default())
}

fn is_office_conversion(command: &ToolCommand) -> bool {
    command.args.iter().any(|a| a == "--convert-to")
}

#[async_trait]
impl ProcessLauncher for FakeLauncher {
    async fn start(&self, command: &ToolCommand) -> Result<Box<dyn RunningProcess>, PreviewError> {
        let input = input_path(command);
        let input_len = tokio::fs::metadata(&input).await.ok().map(|m| m.len());
        self.calls.lock().unwrap().push(Call {
            command: command.clone(),
            input,
            input_len,
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let exit = match &self.behavior {
            Behavior::Unavailable => {
                return Err(PreviewError::ToolUnavailable {
                    tool: command.program.clone(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            }
            Behavior::Fails { code, output } => Some(ToolExit {
                success: false,
                code: Some(*code),
                output: output.clone(),
            }),
            Behavior::Hangs => None,
            Behavior::SucceedsWithoutOutput => Some(success()),
            Behavior::Produces(bytes) => {
                tokio::fs::write(artifact_path(command), bytes).await?;
                Some(success())
            }
        };

        Ok(Box::new(FakeProcess {
            exit,
            kills: self.kills.clone(),
        }))
    }
}

fn success() -> ToolExit {
    ToolExit {
        success: true,
        code: Some(0),
        output: String::new(),
    }
}

struct FakeProcess {
    exit: Option<ToolExit>,
    kills: Arc<AtomicUsize>,
}

#[async_trait]
impl RunningProcess for FakeProcess {
    async fn wait_with_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<ToolExit>, PreviewError> {
        match self.exit.take() {
            Some(exit) => Ok(Some(exit)),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }

    async fn kill(&mut self) -> Result<(), PreviewError> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
