//! The terminal collaborator: a program running in a pseudo-terminal that
//! receives keystrokes and exposes its visible text.

mod pty;
mod reader;
mod screen;

pub use pty::PtyTerminal;
pub use screen::{Screen, strip_ansi};

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub cols: u16,
    pub rows: u16,
}

/// What to run and how large the terminal is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; `None` inherits the caller's.
    pub cwd: Option<PathBuf>,
    pub size: TerminalSize,
}

/// A terminal session the engine can drive.
///
/// At most one session is open at a time. Every method except
/// [`open`](Self::open) and [`close`](Self::close) fails while no session
/// is open.
#[async_trait(?Send)]
pub trait TerminalDriver {
    async fn open(&mut self, spec: &SessionSpec) -> Result<()>;

    fn is_open(&self) -> bool;

    /// Write raw bytes as if typed.
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// The currently visible text, escape sequences included.
    fn capture(&mut self) -> Result<String>;

    /// End the session. Closing when nothing is open is a no-op.
    async fn close(&mut self) -> Result<()>;
}
