//! Scoped temporary workspaces for external tool invocations.
//!
//! Every tool run gets its own uniquely named directory under the configured temp
//! root. The directory and everything in it is removed when the workspace is closed
//! or dropped, so early returns, `?` and unwinding all clean up the same way.

use std::io;
use std::path::{Path, PathBuf};

use docpreview_core::PreviewError;
use tempfile::TempDir;
use uuid::Uuid;

/// Byte limit for a workspace file name. Below the usual 255-byte `NAME_MAX` so the
/// suffixes the handlers add (`input-`, `.bin`, `.pdf`) still fit.
const MAX_FILENAME_BYTES: usize = 240;

/// Extensions longer than this are not treated as extensions when shortening a name.
const MAX_EXTENSION_BYTES: usize = 16;

/// Reduce an uploaded filename to a safe single path component.
///
/// Directory parts are stripped, unusual characters become `_`, and anything that
/// is empty or looks like traversal falls back to a generated `<uuid>.bin` name.
/// Overlong names are shortened by bytes, keeping the extension tools rely on.
pub fn sanitize_filename(filename: Option<&str>) -> String {
    let generated = || format!("{}.bin", Uuid::new_v4());

    let Some(filename) = filename else {
        return generated();
    };
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    if base.contains("..") {
        return generated();
    }

    let s: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if is_blank(&s) {
        return generated();
    }
    if s.len() <= MAX_FILENAME_BYTES {
        return s;
    }

    let (stem, extension) = match s.rfind('.') {
        Some(i) if i > 0 && s.len() - i <= MAX_EXTENSION_BYTES => s.split_at(i),
        _ => (s.as_str(), ""),
    };
    let stem = truncate_to_char_boundary(stem, MAX_FILENAME_BYTES - extension.len());
    if is_blank(stem) {
        format!("{}{}", Uuid::new_v4(), extension)
    } else {
        format!("{}{}", stem, extension)
    }
}

fn is_blank(name: &str) -> bool {
    name.trim_matches(|c| c == '.' || c == '_').is_empty()
}

fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    let mut end = s.len().min(max_bytes);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Swap the extension of `name` for `extension` (`report.docx` -> `report.pdf`).
/// Names without an extension get one appended.
pub fn replace_extension(name: &str, extension: &str) -> String {
    match name.rfind('.') {
        Some(i) => format!("{}.{}", &name[..i], extension),
        None => format!("{}.{}", name, extension),
    }
}

/// A temporary directory owned by exactly one pipeline invocation.
#[derive(Debug)]
pub struct ScopedWorkspace {
    dir: TempDir,
}

impl ScopedWorkspace {
    /// Create a fresh directory `<root>/<prefix><random>`.
    pub fn create(root: &Path, prefix: &str) -> Result<Self, PreviewError> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(root)?;
        tracing::debug!(workspace = %dir.path().display(), "Workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write the uploaded bytes into the workspace under a sanitized name.
    pub async fn write_input(
        &self,
        filename: Option<&str>,
        data: &[u8],
    ) -> Result<PathBuf, PreviewError> {
        let path = self.join(&sanitize_filename(filename));
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    /// Read a tool artifact, or `None` if the tool did not produce it.
    pub async fn read_if_exists(&self, path: &Path) -> Result<Option<Vec<u8>>, PreviewError> {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the workspace now. Failures are logged, never returned.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = remove_deepest_first(&path) {
            tracing::warn!(workspace = %path.display(), error = %e, "Workspace entry removal failed");
        }
        match self.dir.close() {
            Ok(()) => tracing::debug!(workspace = %path.display(), "Workspace removed"),
            Err(e) => {
                tracing::warn!(workspace = %path.display(), error = %e, "Workspace removal failed")
            }
        }
    }
}

/// Delete every entry below `root`, deepest paths first. `root` itself is kept.
fn remove_deepest_first(root: &Path) -> io::Result<()> {
    let mut entries = Vec::new();
    collect_entries(root, &mut entries)?;
    entries.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

    let mut first_error = None;
    for entry in entries {
        let result = if entry.is_dir() && !entry.is_symlink() {
            std::fs::remove_dir(&entry)
        } else {
            std::fs::remove_file(&entry)
        };
        if let Err(e) = result {
            if e.kind() != io::ErrorKind::NotFound && first_error.is_none() {
                first_error = Some(e);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn collect_entries(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && !path.is_symlink() {
            collect_entries(&path, out)?;
        }
        out.push(path);
    }
    Ok(())
}
