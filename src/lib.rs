//! # reeltty
//!
//! A keystroke scripting engine that drives an interactive terminal program
//! and records what it shows.
//!
//! A script is a list of key tokens and `@` directives. reeltty checks the
//! whole script up front, inlines `@source` imports, unrolls `@repeat`
//! blocks and then runs the result against a program in a pseudo-terminal.
//! Screens can be saved as text, HTML or PNG, and a recording between
//! `@record:start` and `@record:stop` becomes an animated GIF with optional
//! window decorations.
//!
//! ## Quick start
//!
//! ```no_run
//! use reeltty::{Collaborators, Engine, PtyTerminal, load_str};
//! use reeltty::config::RunConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let loaded = load_str(r#"
//! @set:window_bar:colorful
//! @record:start
//! echo hello Enter
//! @wait:hello
//! @record:stop:hello.gif
//! "#)?;
//!
//!     let mut engine = Engine::new(PtyTerminal::new(), RunConfig::default(), Collaborators::system())
//!         .with_command("bash", vec![]);
//!     engine.run(&loaded.script).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Checking scripts
//!
//! [`validate_str`] and [`validate_file`] run the parser, import resolver
//! and loop expander and return every problem found as a [`Report`]; they
//! never stop at the first error. [`load_str`] and [`load_file`] do the same
//! work and hand back an executable [`Script`] when nothing is wrong.
//!
//! ## Script syntax
//!
//! | Line | Meaning |
//! |------|---------|
//! | `ls -la Enter` | Type `ls`, `-la`, press Enter (one key per token) |
//! | `Up 5` | Press a named key five times |
//! | `Enter@500` | Press Enter, then wait 500 ms instead of the default delay |
//! | `@set:<key>:<value>` | Set an option (`cols`, `delay`, `window_bar`, ...) |
//! | `@sleep:<ms>[:capture]` | Pause; `capture` also records a frame before and after |
//! | `@wait:<text>` / `@wait:/<regex>/` | Wait until the screen shows a match |
//! | `@capture[:<name>[.txt\|.html\|.png]]` | Save the screen, or print it |
//! | `@record:start\|pause\|resume\|stop:<name>.gif` | Control the recording |
//! | `@hide` / `@show` | Keep typing but stop/restart recording frames |
//! | `@frame` | Record one frame now |
//! | `@repeat:<n>` ... `@end` | Repeat a block `n` times |
//! | `@require:<command>` | Fail early unless `command` is on `PATH` |
//! | `@source:<path>` | Inline another script, relative to this one |
//! | `@pause` | Wait for Enter on stdin |
//! | `# comment` | Full-line or trailing comment |
//!
//! ## Collaborators
//!
//! The engine talks to the outside world through narrow traits so it can be
//! driven against fakes: [`TerminalDriver`] for the terminal,
//! [`SnapshotRenderer`](snapshot::SnapshotRenderer) for HTML/PNG
//! conversion, [`FrameEncoder`](encoder::FrameEncoder) for the animation
//! and [`ContinueSignal`](engine::ContinueSignal) for `@pause`.

pub mod compositor;
pub mod config;
pub mod decorate;
pub mod diagnostic;
pub mod directives;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod imports;
pub mod keys;
pub mod loader;
pub mod options;
pub mod parser;
pub mod recording;
pub mod repeat;
pub mod script;
pub mod snapshot;
pub(crate) mod suggest;
pub mod terminal;
pub mod theme;

pub use diagnostic::{Diagnostic, Report, Severity};
pub use engine::{Collaborators, Engine, RunSummary};
pub use error::{ConfigError, RunError, StructuralError};
pub use loader::{LoadError, Loaded, load_file, load_str, validate_file, validate_str};
pub use parser::{Parsed, parse_str};
pub use script::{Directive, DirectiveKind, Script};
pub use terminal::{PtyTerminal, TerminalDriver};
