//! Turning captured terminal text into files.
//!
//! Conversion to HTML and PNG is delegated to external programs behind the
//! [`SnapshotRenderer`] trait. A missing converter only drops that format.

use crate::compositor::DecorationOptions;
use crate::decorate;
use crate::directives::CaptureFormat;
use crate::error::RunError;
use anyhow::{Context as _, Result, anyhow, bail};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// ANSI-to-HTML converter.
pub const MARKUP_TOOL: &str = "aha";
/// ANSI-to-PNG renderer.
pub const BITMAP_TOOL: &str = "termshot";

pub trait SnapshotRenderer {
    fn markup_available(&self) -> bool;

    fn bitmap_available(&self) -> bool;

    /// Convert ANSI-colored text to an HTML document.
    fn render_markup(&self, ansi: &str) -> Result<String>;

    /// Render the ANSI text stored at `source` as a PNG `cols` columns wide.
    fn render_bitmap(&self, source: &Path, cols: u16, output: &Path) -> Result<()>;
}

/// Renderer backed by `aha` and `termshot` from `PATH`.
#[derive(Debug, Clone, Default)]
pub struct ExternalRenderer {
    aha: Option<PathBuf>,
    termshot: Option<PathBuf>,
}

impl ExternalRenderer {
    pub fn discover() -> Self {
        let renderer = Self {
            aha: which::which(MARKUP_TOOL).ok(),
            termshot: which::which(BITMAP_TOOL).ok(),
        };
        tracing::debug!(aha = ?renderer.aha, termshot = ?renderer.termshot, "snapshot tools");
        renderer
    }
}

impl SnapshotRenderer for ExternalRenderer {
    fn markup_available(&self) -> bool {
        self.aha.is_some()
    }

    fn bitmap_available(&self) -> bool {
        self.termshot.is_some()
    }

    fn render_markup(&self, ansi: &str) -> Result<String> {
        let program = self
            .aha
            .as_ref()
            .ok_or_else(|| anyhow!("{MARKUP_TOOL} was not found on PATH"))?;
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| spawn_error(MARKUP_TOOL, error))?;
        child
            .stdin
            .take()
            .context("aha stdin unavailable")?
            .write_all(ansi.as_bytes())
            .context("Failed to write to aha")?;
        let output = child.wait_with_output().context("Failed to wait for aha")?;
        if !output.status.success() {
            bail!(
                "{MARKUP_TOOL} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        String::from_utf8(output.stdout).context("aha produced invalid UTF-8")
    }

    fn render_bitmap(&self, source: &Path, cols: u16, output: &Path) -> Result<()> {
        let program = self
            .termshot
            .as_ref()
            .ok_or_else(|| anyhow!("{BITMAP_TOOL} was not found on PATH"))?;
        let result = Command::new(program)
            .arg("--raw-read")
            .arg(source)
            .arg("--columns")
            .arg(cols.to_string())
            .arg("--no-decoration")
            .arg("--no-shadow")
            .arg("--filename")
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .map_err(|error| spawn_error(BITMAP_TOOL, error))?;
        if !result.status.success() {
            bail!(
                "{BITMAP_TOOL} exited with {}: {}",
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }
        Ok(())
    }
}

fn spawn_error(tool: &str, error: std::io::Error) -> anyhow::Error {
    if error.kind() == ErrorKind::NotFound {
        anyhow!("{tool} was not found on PATH")
    } else {
        anyhow!("failed to spawn {tool}: {error}")
    }
}

/// A named `@capture` to write to disk.
#[derive(Debug)]
pub struct CaptureJob<'a> {
    /// Output path without extension; one file per format is written.
    pub stem: PathBuf,
    pub text: &'a str,
    pub formats: &'a [CaptureFormat],
    pub cols: u16,
    pub keep_raw: bool,
    pub decorations: &'a DecorationOptions,
}

/// Write every requested format that can be produced and return the files
/// written.
///
/// The text snapshot is always written first since the other formats are
/// derived from it; it is removed again unless it was requested or
/// `keep_raw` is set.
pub fn write_capture(
    renderer: &dyn SnapshotRenderer,
    job: &CaptureJob<'_>,
) -> Result<Vec<PathBuf>, RunError> {
    let path_for = |format: CaptureFormat| {
        let mut name = job.stem.as_os_str().to_os_string();
        name.push(".");
        name.push(format.extension());
        PathBuf::from(name)
    };
    let raw = path_for(CaptureFormat::Txt);
    if let Some(parent) = raw.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| RunError::io(format!("failed to create {}", parent.display()), e))?;
    }
    std::fs::write(&raw, job.text)
        .map_err(|e| RunError::io(format!("failed to write {}", raw.display()), e))?;

    let mut written = Vec::new();
    for &format in job.formats {
        match format {
            CaptureFormat::Txt => written.push(raw.clone()),
            CaptureFormat::Html if renderer.markup_available() => {
                let path = path_for(format);
                let html = renderer
                    .render_markup(job.text)
                    .map_err(|error| RunError::Snapshot {
                        path: path.clone(),
                        error,
                    })?;
                std::fs::write(&path, html)
                    .map_err(|e| RunError::io(format!("failed to write {}", path.display()), e))?;
                written.push(path);
            }
            CaptureFormat::Png if renderer.bitmap_available() => {
                let path = path_for(format);
                renderer
                    .render_bitmap(&raw, job.cols, &path)
                    .map_err(|error| RunError::Snapshot {
                        path: path.clone(),
                        error,
                    })?;
                if job.decorations.is_decorated() {
                    decorate::decorate_png(&path, job.decorations).map_err(|source| {
                        RunError::Encoding {
                            path: path.clone(),
                            source,
                        }
                    })?;
                }
                written.push(path);
            }
            CaptureFormat::Html => {
                tracing::warn!("{MARKUP_TOOL} not found; skipping {}", path_for(format).display());
            }
            CaptureFormat::Png => {
                tracing::warn!("{BITMAP_TOOL} not found; skipping {}", path_for(format).display());
            }
        }
    }

    if !job.formats.contains(&CaptureFormat::Txt) && !job.keep_raw {
        std::fs::remove_file(&raw)
            .map_err(|e| RunError::io(format!("failed to remove {}", raw.display()), e))?;
    }
    for path in &written {
        tracing::info!("captured {}", path.display());
    }
    Ok(written)
}
