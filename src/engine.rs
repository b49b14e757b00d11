//! The execution engine: walks a loaded [`Script`] against a terminal,
//! timing keys, waiting for output, saving captures and driving the
//! recording state machine.

use crate::compositor;
use crate::config::RunConfig;
use crate::directives::{CaptureTarget, RecordControl, WaitPattern};
use crate::encoder::{FrameEncoder, GifEncoder};
use crate::error::RunError;
use crate::keys::KeyPress;
use crate::options::OptionKey;
use crate::recording::{self, FinishedRecording, Recorder, Transition};
use crate::script::{Directive, DirectiveKind, Origin, Script};
use crate::snapshot::{self, CaptureJob, ExternalRenderer, SnapshotRenderer};
use crate::terminal::{SessionSpec, TerminalDriver, strip_ansi};
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::time::{Instant, sleep};

/// How often `@wait` looks at the screen.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Where `@pause` gets its go-ahead from.
#[async_trait(?Send)]
pub trait ContinueSignal {
    /// Block until the run may continue.
    async fn wait(&mut self) -> io::Result<()>;
}

/// Continue on a line (or EOF) from standard input.
#[derive(Debug, Default)]
pub struct StdinSignal;

#[async_trait(?Send)]
impl ContinueSignal for StdinSignal {
    async fn wait(&mut self) -> io::Result<()> {
        let mut line = String::new();
        tokio::io::BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        Ok(())
    }
}

/// Everything outside the terminal that the engine hands work to.
pub struct Collaborators {
    pub snapshots: Box<dyn SnapshotRenderer>,
    pub encoder: Box<dyn FrameEncoder>,
    pub resume: Box<dyn ContinueSignal>,
    /// Receives console captures.
    pub console: Box<dyn Write>,
}

impl Collaborators {
    /// External snapshot tools from `PATH`, the GIF encoder, stdin and
    /// stdout.
    pub fn system() -> Self {
        Self {
            snapshots: Box::new(ExternalRenderer::discover()),
            encoder: Box::new(GifEncoder::default()),
            resume: Box::new(StdinSignal),
            console: Box::new(io::stdout()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub directives: usize,
    /// Capture files and recordings written, in order.
    pub artifacts: Vec<PathBuf>,
}

/// Executes a [`Script`] against a terminal, one directive at a time.
pub struct Engine<T: TerminalDriver> {
    terminal: T,
    config: RunConfig,
    command: Option<(String, Vec<String>)>,
    collaborators: Collaborators,
    recorder: Recorder,
    artifacts: Vec<PathBuf>,
}

impl<T: TerminalDriver> Engine<T> {
    pub fn new(terminal: T, config: RunConfig, collaborators: Collaborators) -> Self {
        Self {
            terminal,
            config,
            command: None,
            collaborators,
            recorder: Recorder::new(),
            artifacts: Vec::new(),
        }
    }

    /// Run `program` in the terminal instead of the configured shell.
    pub fn with_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.command = Some((program.into(), args));
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute every directive in order.
    ///
    /// Missing tools are reported before anything runs. Any error stops the
    /// run; the terminal session is closed either way.
    pub async fn run(&mut self, script: &Script) -> Result<RunSummary, RunError> {
        self.preflight(script)?;
        for dir in recording::stale_frame_dirs(&self.config.output_dir) {
            tracing::warn!(
                "leftover frame directory from an earlier run: {} (remove it manually)",
                dir.display()
            );
        }

        let result = self.execute_all(script.directives()).await;
        if result.is_ok() {
            self.recorder.abandon();
        }
        let closed = self.terminal.close().await.map_err(RunError::terminal);
        result?;
        closed?;

        Ok(RunSummary {
            directives: script.len(),
            artifacts: std::mem::take(&mut self.artifacts),
        })
    }

    fn preflight(&self, script: &Script) -> Result<(), RunError> {
        for directive in script.directives() {
            match &directive.kind {
                DirectiveKind::Require(name) => {
                    if which::which(name).is_err() {
                        return Err(RunError::MissingDependency {
                            name: name.clone(),
                            needed_by: format!("@require at {}", directive.origin),
                        });
                    }
                }
                DirectiveKind::Record(RecordControl::Start)
                    if !self.collaborators.snapshots.bitmap_available() =>
                {
                    return Err(RunError::MissingDependency {
                        name: snapshot::BITMAP_TOOL.to_string(),
                        needed_by: format!("@record at {}", directive.origin),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn execute_all(&mut self, directives: &[Directive]) -> Result<(), RunError> {
        for directive in directives {
            tracing::debug!(origin = %directive.origin, "executing {}", directive.origin.text);
            self.execute(directive).await?;
        }
        Ok(())
    }

    async fn execute(&mut self, directive: &Directive) -> Result<(), RunError> {
        let origin = &directive.origin;
        match &directive.kind {
            DirectiveKind::Set(setting) => {
                if matches!(setting.key, OptionKey::Cols | OptionKey::Rows)
                    && self.terminal.is_open()
                {
                    tracing::warn!(
                        "{origin}: @set:{} after the terminal started has no effect on its size",
                        setting.key
                    );
                }
                self.config.apply_setting(setting);
            }
            DirectiveKind::Sleep { ms, capture } => {
                if *capture {
                    self.capture_frame().await?;
                }
                sleep(Duration::from_millis(*ms)).await;
                if *capture {
                    self.capture_frame().await?;
                }
            }
            DirectiveKind::Wait(pattern) => self.wait_for(pattern, origin).await?,
            DirectiveKind::Capture(target) => self.capture(target).await?,
            DirectiveKind::Record(control) => self.record(control, origin).await?,
            DirectiveKind::Hide => note(self.recorder.hide(), origin),
            DirectiveKind::Show => note(self.recorder.show(), origin),
            DirectiveKind::Frame => {
                if !self.recorder.is_active() {
                    tracing::debug!("{origin}: @frame outside a recording");
                }
                self.capture_frame().await?;
            }
            DirectiveKind::Require(_) => {}
            DirectiveKind::Pause => {
                tracing::info!("{origin}: paused; press Enter to continue");
                self.collaborators
                    .resume
                    .wait()
                    .await
                    .map_err(RunError::Continue)?;
            }
            DirectiveKind::Key(press) => self.press(press).await?,
            DirectiveKind::Source(_) | DirectiveKind::RepeatStart(_) | DirectiveKind::RepeatEnd => {
                return Err(RunError::Unresolved {
                    origin: origin.clone(),
                });
            }
        }
        Ok(())
    }

    /// Start the terminal session on first use.
    async fn ensure_terminal(&mut self) -> Result<(), RunError> {
        if self.terminal.is_open() {
            return Ok(());
        }
        let (program, args) = match &self.command {
            Some((program, args)) => (program.clone(), args.clone()),
            None => (self.config.shell_program(), Vec::new()),
        };
        let spec = SessionSpec {
            program,
            args,
            cwd: None,
            size: self.config.terminal_size(),
        };
        self.terminal.open(&spec).await.map_err(RunError::terminal)
    }

    async fn screen(&mut self) -> Result<String, RunError> {
        self.ensure_terminal().await?;
        self.terminal.capture().map_err(RunError::terminal)
    }

    async fn press(&mut self, press: &KeyPress) -> Result<(), RunError> {
        self.ensure_terminal().await?;
        self.terminal
            .send(&press.bytes())
            .await
            .map_err(RunError::terminal)?;
        let delay = press
            .delay_ms
            .map_or(self.config.delay, Duration::from_millis);
        sleep(delay).await;
        Ok(())
    }

    async fn wait_for(&mut self, pattern: &WaitPattern, origin: &Origin) -> Result<(), RunError> {
        let timeout = self.config.timeout;
        // A timeout too large to represent waits without a deadline.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let text = strip_ansi(&self.screen().await?);
            if pattern.is_match(&text) {
                tracing::debug!("{origin}: matched {pattern}");
                return Ok(());
            }
            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    return Err(RunError::WaitTimeout {
                        pattern: pattern.to_string(),
                        timeout,
                        origin: origin.clone(),
                    });
                }
                Some(deadline) => WAIT_POLL_INTERVAL.min(deadline - now),
                None => WAIT_POLL_INTERVAL,
            };
            sleep(pause).await;
        }
    }

    async fn capture(&mut self, target: &CaptureTarget) -> Result<(), RunError> {
        let text = self.screen().await?;
        match target {
            CaptureTarget::Console => {
                let console = &mut self.collaborators.console;
                writeln!(console, "{text}")
                    .and_then(|()| console.flush())
                    .map_err(|e| RunError::io("failed to write console capture", e))?;
            }
            CaptureTarget::Named { name, formats } => {
                let job = CaptureJob {
                    stem: self.config.output_dir.join(name),
                    text: &text,
                    formats,
                    cols: self.config.cols,
                    keep_raw: self.config.keep_raw,
                    decorations: &self.config.decorations,
                };
                let written = snapshot::write_capture(self.collaborators.snapshots.as_ref(), &job)?;
                self.artifacts.extend(written);
            }
        }
        Ok(())
    }

    /// Capture one recording frame. A no-op unless a recording is active
    /// and neither paused nor hidden.
    async fn capture_frame(&mut self) -> Result<bool, RunError> {
        let (Some(path), Some(cols)) = (
            self.recorder.next_frame_path(),
            self.recorder.session().map(|s| s.cols()),
        ) else {
            return Ok(false);
        };
        let text = self.screen().await?;
        let raw = path.with_extension("txt");
        std::fs::write(&raw, &text)
            .map_err(|e| RunError::io(format!("failed to write {}", raw.display()), e))?;
        self.collaborators
            .snapshots
            .render_bitmap(&raw, cols, &path)
            .map_err(|error| RunError::Snapshot {
                path: path.clone(),
                error,
            })?;
        if let Err(error) = std::fs::remove_file(&raw) {
            tracing::debug!("failed to remove {}: {error}", raw.display());
        }
        Ok(self.recorder.commit_frame(path))
    }

    async fn record(&mut self, control: &RecordControl, origin: &Origin) -> Result<(), RunError> {
        match control {
            RecordControl::Start => {
                let transition = self
                    .recorder
                    .start(&self.config.output_dir, self.config.cols)?;
                if transition.is_applied() {
                    tracing::info!("{origin}: recording started");
                }
                note(transition, origin);
            }
            RecordControl::Pause => note(self.recorder.pause(), origin),
            RecordControl::Resume => {
                let transition = self.recorder.resume();
                note(transition, origin);
                if transition.is_applied() {
                    self.capture_frame().await?;
                }
            }
            RecordControl::Stop(name) => {
                if !self.recorder.is_active() {
                    note(Transition::Ignored("no active recording to stop"), origin);
                    return Ok(());
                }
                self.capture_frame().await?;
                if let Some(finished) = self.recorder.stop() {
                    self.compile(finished, name, origin)?;
                }
            }
        }
        Ok(())
    }

    /// Turn a stopped recording into its artifact. The frame directory is
    /// removed afterwards whether or not encoding succeeded.
    fn compile(
        &mut self,
        finished: FinishedRecording,
        name: &str,
        origin: &Origin,
    ) -> Result<(), RunError> {
        let FinishedRecording { frames, frame_dir } = finished;
        let output = self.config.output_dir.join(name);
        if frames.is_empty() {
            tracing::warn!("{origin}: no frames were captured; {} not written", output.display());
            return Ok(());
        }
        let captured = frames.len();
        let deco = &self.config.decorations;
        let frames = recording::loop_offset_frames(frames, deco.loop_offset_ms, deco.frame_delay_ms);
        tracing::info!(
            "{origin}: compiling {} ({captured} frames, {} with loop offset)",
            output.display(),
            frames.len()
        );

        let encoding_error = |source| RunError::Encoding {
            path: output.clone(),
            source,
        };
        let encoder = &self.collaborators.encoder;
        let request = compositor::build_request(frames, deco, encoder.supports_composition())
            .map_err(encoding_error)?;
        encoder.encode(&request, &output).map_err(encoding_error)?;

        if let Err(error) = frame_dir.close() {
            tracing::warn!("failed to remove frame directory: {error}");
        }
        self.artifacts.push(output);
        Ok(())
    }
}

/// Log a transition that did not apply.
fn note(transition: Transition, origin: &Origin) {
    if let Transition::Ignored(reason) = transition {
        tracing::warn!("{origin}: {reason}; ignored");
    }
}
