use super::reader::spawn_reader;
use super::screen::Screen;
use super::{SessionSpec, TerminalDriver, TerminalSize};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::sync::mpsc::Receiver;

/// A program running inside a PTY.
struct PtySession {
    // Dropping the master closes the PTY.
    _master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
}

impl PtySession {
    /// Spawn the program, returning the session and its output reader
    /// separately.
    fn spawn(spec: &SessionSpec) -> Result<(Self, Box<dyn Read + Send>)> {
        let pty_system = portable_pty::native_pty_system();
        let pair = pty_system
            .openpty(pty_size(spec.size))
            .context("Failed to open PTY")?;

        let mut cmd = CommandBuilder::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.cwd(dir);
        }
        if std::env::var_os("TERM").is_none() {
            cmd.env("TERM", "xterm-256color");
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("Failed to spawn '{}'", spec.program))?;
        let writer = pair
            .master
            .take_writer()
            .context("Failed to get PTY writer")?;
        let reader = pair
            .master
            .try_clone_reader()
            .context("Failed to get PTY reader")?;

        Ok((
            PtySession {
                _master: pair.master,
                child,
                writer,
            },
            reader,
        ))
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        self.child.try_wait().ok().flatten().is_none()
    }

    /// Kill the program if it is still running and reap it.
    fn terminate(&mut self) -> Result<()> {
        if self.is_running() {
            self.child.kill().context("Failed to kill terminal program")?;
        }
        self.child.wait().context("Failed to wait for terminal program")?;
        Ok(())
    }
}

fn pty_size(size: TerminalSize) -> PtySize {
    PtySize {
        rows: size.rows,
        cols: size.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

struct Live {
    pty: PtySession,
    output_rx: Receiver<Vec<u8>>,
    screen: Screen,
    rows: u16,
}

impl Live {
    /// Move everything the reader thread has produced onto the screen.
    fn drain(&mut self) {
        while let Ok(data) = self.output_rx.try_recv() {
            self.screen.feed(&data);
        }
    }
}

/// [`TerminalDriver`] backed by a native PTY.
#[derive(Default)]
pub struct PtyTerminal {
    live: Option<Live>,
}

impl PtyTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&mut self) -> Result<&mut Live> {
        match self.live.as_mut() {
            Some(live) => Ok(live),
            None => bail!("terminal session is not open"),
        }
    }
}

#[async_trait(?Send)]
impl TerminalDriver for PtyTerminal {
    async fn open(&mut self, spec: &SessionSpec) -> Result<()> {
        if self.live.is_some() {
            bail!("terminal session is already open");
        }
        let (pty, reader) = PtySession::spawn(spec)?;
        let output_rx = spawn_reader(reader).context("Failed to start PTY reader")?;
        tracing::info!(
            program = %spec.program,
            cols = spec.size.cols,
            rows = spec.size.rows,
            "terminal session started"
        );
        self.live = Some(Live {
            pty,
            output_rx,
            screen: Screen::new(),
            rows: spec.size.rows,
        });
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.live.is_some()
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let live = self.live()?;
        live.pty.write(bytes).context("Failed to write to terminal")?;
        live.drain();
        Ok(())
    }

    fn capture(&mut self) -> Result<String> {
        let live = self.live()?;
        live.drain();
        Ok(live.screen.visible(live.rows))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut live) = self.live.take() {
            live.pty.terminate()?;
            tracing::info!("terminal session closed");
        }
        Ok(())
    }
}

impl Drop for PtyTerminal {
    fn drop(&mut self) {
        if let Some(live) = self.live.as_mut() {
            if let Err(error) = live.pty.terminate() {
                tracing::debug!("terminal teardown on drop failed: {error:#}");
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn spec(program: &str, args: &[&str]) -> SessionSpec {
        SessionSpec {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: None,
            size: TerminalSize { cols: 80, rows: 24 },
        }
    }

    async fn capture_until(term: &mut PtyTerminal, needle: &str) -> String {
        for _ in 0..50 {
            let text = term.capture().unwrap();
            if text.contains(needle) {
                return text;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        term.capture().unwrap()
    }

    #[tokio::test]
    async fn test_pty_echo() {
        let mut term = PtyTerminal::new();
        term.open(&spec("echo", &["hello"])).await.unwrap();
        let text = capture_until(&mut term, "hello").await;
        assert!(text.contains("hello"));
        term.close().await.unwrap();
        assert!(!term.is_open());
    }

    #[tokio::test]
    async fn test_pty_send_to_cat() {
        let mut term = PtyTerminal::new();
        term.open(&spec("cat", &[])).await.unwrap();
        term.send(b"typed line\r").await.unwrap();
        let text = capture_until(&mut term, "typed line").await;
        assert!(text.contains("typed line"));
        term.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_without_session_fails() {
        let mut term = PtyTerminal::new();
        assert!(term.send(b"x").await.is_err());
        assert!(term.capture().is_err());
    }
}
