//! External process capability.
//!
//! Handlers never spawn processes directly. They describe a [`ToolCommand`] and hand it
//! to a [`ProcessLauncher`], and [`run_tool`] applies the wait/timeout/kill policy. This
//! keeps the timeout policy in one place and lets tests substitute fake tools.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use docpreview_core::PreviewError;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Captured diagnostics are truncated to this many bytes when logged.
const MAX_LOGGED_OUTPUT: usize = 4096;

/// How long to keep reading output after exit, in case a detached child holds the pipes.
const OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// A fully specified external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `ffmpeg -y -i <input> -ss <seek> -vframes 1 -vf scale=<width>:-1 <output>`
    pub fn ffmpeg_frame(
        ffmpeg_path: &str,
        input: &Path,
        seek: &str,
        frame_width: u32,
        output: &Path,
    ) -> Self {
        Self::new(
            ffmpeg_path,
            vec![
                "-y".to_string(),
                "-i".to_string(),
                input.to_string_lossy().to_string(),
                "-ss".to_string(),
                seek.to_string(),
                "-vframes".to_string(),
                "1".to_string(),
                "-vf".to_string(),
                format!("scale={}:-1", frame_width),
                output.to_string_lossy().to_string(),
            ],
        )
    }

    /// `libreoffice --headless --convert-to pdf --outdir <dir> <input>`
    pub fn office_to_pdf(converter_path: &str, outdir: &Path, input: &Path) -> Self {
        Self::new(
            converter_path,
            vec![
                "--headless".to_string(),
                "--convert-to".to_string(),
                "pdf".to_string(),
                "--outdir".to_string(),
                outdir.to_string_lossy().to_string(),
                input.to_string_lossy().to_string(),
            ],
        )
    }
}

/// How a finished tool exited, with stdout and stderr merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExit {
    pub success: bool,
    pub code: Option<i32>,
    pub output: String,
}

impl ToolExit {
    /// Output trimmed to a size suitable for a log line.
    pub fn output_for_log(&self) -> &str {
        let mut end = self.output.len().min(MAX_LOGGED_OUTPUT);
        while !self.output.is_char_boundary(end) {
            end -= 1;
        }
        &self.output[..end]
    }
}

/// Starts external processes.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn start(&self, command: &ToolCommand) -> Result<Box<dyn RunningProcess>, PreviewError>;
}

/// A started external process.
#[async_trait]
pub trait RunningProcess: Send {
    /// Wait for exit. `Ok(None)` means the timeout elapsed and the process is still running.
    async fn wait_with_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<ToolExit>, PreviewError>;

    /// Forcibly terminate the process and reap it.
    async fn kill(&mut self) -> Result<(), PreviewError>;
}

/// Start `command`, wait at most `timeout`, and kill it if it overruns.
///
/// A non-zero exit is returned as a [`ToolExit`], not an error: callers decide success by
/// whether the artifact they asked for exists.
pub async fn run_tool(
    launcher: &dyn ProcessLauncher,
    command: &ToolCommand,
    timeout: Duration,
) -> Result<ToolExit, PreviewError> {
    tracing::debug!(tool = %command.program, args = ?command.args, "Starting external tool");
    let mut process = launcher.start(command).await?;

    match process.wait_with_timeout(timeout).await? {
        Some(exit) => {
            if exit.success {
                tracing::debug!(tool = %command.program, "External tool finished");
            } else {
                tracing::debug!(
                    tool = %command.program,
                    code = ?exit.code,
                    output = %exit.output_for_log(),
                    "External tool exited with failure"
                );
            }
            Ok(exit)
        }
        None => {
            tracing::warn!(
                tool = %command.program,
                timeout = ?timeout,
                "External tool timed out, killing"
            );
            if let Err(e) = process.kill().await {
                tracing::warn!(
                    tool = %command.program,
                    error = %e,
                    "Failed to kill external tool"
                );
            }
            Err(PreviewError::ToolTimedOut {
                tool: command.program.clone(),
                timeout,
            })
        }
    }
}

/// [`ProcessLauncher`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessLauncher;

#[async_trait]
impl ProcessLauncher for TokioProcessLauncher {
    async fn start(&self, command: &ToolCommand) -> Result<Box<dyn RunningProcess>, PreviewError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout also reaches helpers the tool forks
        // (libreoffice hands the work to a separate soffice.bin).
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    PreviewError::ToolUnavailable {
                        tool: command.program.clone(),
                        source: e,
                    }
                }
                _ => PreviewError::Io(e),
            })?;

        // Drain both pipes concurrently so a chatty tool can never block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        Ok(Box::new(TokioProcess {
            child,
            stdout,
            stderr,
        }))
    }
}

struct TokioProcess {
    child: Child,
    stdout: Option<JoinHandle<Vec<u8>>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
}

fn drain<R>(mut reader: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf).await;
        buf
    })
}

impl TokioProcess {
    async fn collect_output(&mut self) -> String {
        let mut merged = Vec::new();
        for mut handle in [self.stdout.take(), self.stderr.take()].into_iter().flatten() {
            match tokio::time::timeout(OUTPUT_GRACE, &mut handle).await {
                Ok(Ok(bytes)) => merged.extend_from_slice(&bytes),
                Ok(Err(_)) => {}
                Err(_) => handle.abort(),
            }
        }
        String::from_utf8_lossy(&merged).into_owned()
    }

    fn exit_from(status: ExitStatus, output: String) -> ToolExit {
        ToolExit {
            success: status.success(),
            code: status.code(),
            output,
        }
    }
}

/// SIGKILL every process in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) takes plain integers and touches no memory owned by this process.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!(
            pgid,
            error = %io::Error::last_os_error(),
            "Process group kill failed"
        );
    }
}

#[async_trait]
impl RunningProcess for TokioProcess {
    async fn wait_with_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<ToolExit>, PreviewError> {
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                let output = self.collect_output().await;
                Ok(Some(Self::exit_from(status, output)))
            }
            Err(_) => Ok(None),
        }
    }

    async fn kill(&mut self) -> Result<(), PreviewError> {
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id() {
                kill_process_group(pid);
            }
        }
        self.child.kill().await?;
        for handle in [self.stdout.take(), self.stderr.take()].into_iter().flatten() {
            handle.abort();
        }
        Ok(())
    }
}
