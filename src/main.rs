use anyhow::{Context, Result, bail};
use clap::Parser;
use reeltty::config::{self, ConfigLayers, RunConfig};
use reeltty::loader::{self, LoadError, Loaded};
use reeltty::options::{OptionKey, OptionValue};
use reeltty::{Collaborators, Engine, PtyTerminal, Report, RunError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "reeltty",
    about = "Drive a terminal program with a keystroke script and record it",
    version
)]
struct Args {
    /// Script file to run
    #[arg(short = 'f', long = "keys", value_name = "FILE", conflicts_with = "inline")]
    keys: Option<PathBuf>,

    /// Inline script line; repeat for several lines
    #[arg(short = 'k', long = "inline", value_name = "LINE")]
    inline: Vec<String>,

    /// Directory for captures and recordings
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Terminal width in columns
    #[arg(long)]
    cols: Option<u16>,

    /// Terminal height in rows
    #[arg(long)]
    rows: Option<u16>,

    /// Default delay after each key, in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// How long @wait waits, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Shell to start when no command is given
    #[arg(long)]
    shell: Option<String>,

    /// Named preset from the config directory
    #[arg(long)]
    preset: Option<String>,

    /// Override any option, e.g. --set window_bar=colorful
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Check the script and report problems without running it
    #[arg(long)]
    validate_only: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Program to run in the terminal (default: the shell)
    #[arg(last = true, value_name = "COMMAND")]
    command: Vec<String>,
}

enum ScriptSource {
    File(PathBuf),
    Inline(String),
}

impl ScriptSource {
    fn from_args(args: &Args) -> Result<Self> {
        match (&args.keys, args.inline.is_empty()) {
            (Some(path), _) => Ok(Self::File(path.clone())),
            (None, false) => Ok(Self::Inline(args.inline.join("\n"))),
            (None, true) => bail!("no script given; use --keys <FILE> or --inline <LINE>"),
        }
    }

    /// Where project config is looked up.
    fn project_dir(&self) -> Result<PathBuf> {
        match self {
            Self::File(path) => Ok(path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .to_path_buf()),
            Self::Inline(_) => std::env::current_dir().context("Failed to read current directory"),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            let code = error
                .downcast_ref::<RunError>()
                .map_or(1, RunError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let source = ScriptSource::from_args(&args)?;

    if args.validate_only {
        let report = match &source {
            ScriptSource::File(path) => loader::validate_file(path)?,
            ScriptSource::Inline(content) => loader::validate_str(content),
        };
        println!("{report}");
        return Ok(exit_for(&report));
    }

    let loaded = match &source {
        ScriptSource::File(path) => loader::load_file(path),
        ScriptSource::Inline(content) => loader::load_str(content),
    };
    let Loaded { script, report } = match loaded {
        Ok(loaded) => loaded,
        Err(LoadError::Invalid(report)) => {
            eprintln!("{report}");
            return Ok(ExitCode::FAILURE);
        }
        Err(error) => return Err(error.into()),
    };
    for warning in report.warnings() {
        eprintln!("{warning}");
    }

    let layers = ConfigLayers::discover(&source.project_dir()?, args.preset.as_deref())?;
    let config = RunConfig::resolve(&layers, &overrides(&args)?)?;

    let mut engine = Engine::new(PtyTerminal::new(), config, Collaborators::system());
    if let Some((program, rest)) = args.command.split_first() {
        engine = engine.with_command(program.clone(), rest.to_vec());
    }
    let summary = engine.run(&script).await?;
    tracing::info!(
        "ran {} directive(s), wrote {} file(s)",
        summary.directives,
        summary.artifacts.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn exit_for(report: &Report) -> ExitCode {
    if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Invocation overrides, validated with the `@set` grammar.
fn overrides(args: &Args) -> Result<Vec<(OptionKey, OptionValue)>> {
    let flags = [
        (OptionKey::Cols, args.cols.map(|v| v.to_string())),
        (OptionKey::Rows, args.rows.map(|v| v.to_string())),
        (OptionKey::Delay, args.delay.map(|v| v.to_string())),
        (OptionKey::Timeout, args.timeout.map(|v| v.to_string())),
        (OptionKey::Shell, args.shell.clone()),
        (OptionKey::OutputDir, args.output_dir.clone()),
    ];
    let mut values = Vec::new();
    for (key, raw) in flags {
        if let Some(raw) = raw {
            let value = key
                .parse_value(&raw)
                .map_err(|message| anyhow::anyhow!("invalid --{}: {message}", flag_name(key)))?;
            values.push((key, value));
        }
    }
    for raw in &args.set {
        values.push(config::parse_override(raw)?);
    }
    Ok(values)
}

fn flag_name(key: OptionKey) -> String {
    key.name().replace('_', "-")
}
