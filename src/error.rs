//! Typed errors for script assembly, configuration and execution.

use crate::diagnostic::{Diagnostic, Report};
use crate::encoder::EncodeError;
use crate::script::Origin;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Process exit code for a `@wait` that never matched.
pub const EXIT_WAIT_TIMEOUT: u8 = 124;

/// A script whose lines are individually valid but whose shape is not:
/// broken `@repeat`/`@end` pairing or an unresolvable `@source` graph.
#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("import cycle detected: {}", format_chain(.chain))]
    ImportCycle { chain: Vec<PathBuf>, origin: Origin },

    #[error("import depth limit of {limit} exceeded while importing {}", .path.display())]
    ImportDepthExceeded {
        path: PathBuf,
        limit: usize,
        origin: Origin,
    },

    #[error("imported file {} not found (referenced from {origin})", .missing.display())]
    MissingImport { missing: PathBuf, origin: Origin },

    #[error("failed to read imported file {}: {source}", .path.display())]
    ReadImport {
        path: PathBuf,
        source: std::io::Error,
        origin: Origin,
    },

    #[error("imported file {} has {} error(s)", .path.display(), .diagnostics.error_count())]
    InvalidImport {
        path: PathBuf,
        diagnostics: Report,
        origin: Origin,
    },

    #[error("nested @repeat is not allowed (outer @repeat opened at {outer})")]
    NestedRepeat { outer: Origin, origin: Origin },

    #[error("@end without a matching @repeat")]
    UnmatchedEnd { origin: Origin },

    #[error("@repeat is never closed with @end")]
    UnclosedRepeat { origin: Origin },

    #[error("repeat count must be a positive integer")]
    InvalidRepeatCount { origin: Origin },
}

impl StructuralError {
    /// The line that triggered the error.
    pub fn origin(&self) -> &Origin {
        match self {
            Self::ImportCycle { origin, .. }
            | Self::ImportDepthExceeded { origin, .. }
            | Self::MissingImport { origin, .. }
            | Self::ReadImport { origin, .. }
            | Self::InvalidImport { origin, .. }
            | Self::NestedRepeat { origin, .. }
            | Self::UnmatchedEnd { origin }
            | Self::UnclosedRepeat { origin }
            | Self::InvalidRepeatCount { origin } => origin,
        }
    }

    /// Render as diagnostics, including those of an invalid imported file.
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = vec![Diagnostic::error(self.origin(), self.to_string())];
        if let Self::InvalidImport { diagnostics, .. } = self {
            out.extend(diagnostics.diagnostics().iter().cloned());
        }
        out
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Problems with configuration files and overrides.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", .path.display())]
    Invalid {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid override '{raw}': {message}")]
    InvalidOverride { raw: String, message: String },

    #[error("unknown preset '{name}' (looked for {})", .path.display())]
    UnknownPreset { name: String, path: PathBuf },
}

/// Fatal errors while executing a script.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("required command '{name}' not found in PATH (needed by {needed_by})")]
    MissingDependency { name: String, needed_by: String },

    #[error("timed out after {}s waiting for '{pattern}' at {origin}", .timeout.as_secs())]
    WaitTimeout {
        pattern: String,
        timeout: Duration,
        origin: Origin,
    },

    #[error("terminal session failed: {error:#}")]
    Terminal { error: anyhow::Error },

    #[error("snapshot {} failed: {error:#}", .path.display())]
    Snapshot { path: PathBuf, error: anyhow::Error },

    #[error("failed to encode {}: {source}", .path.display())]
    Encoding { path: PathBuf, source: EncodeError },

    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("failed to read continue signal: {0}")]
    Continue(#[source] std::io::Error),

    #[error("directive at {origin} must be resolved before execution")]
    Unresolved { origin: Origin },
}

impl RunError {
    pub fn terminal(error: anyhow::Error) -> Self {
        Self::Terminal { error }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Exit code the CLI reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::WaitTimeout { .. } => EXIT_WAIT_TIMEOUT,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(line: usize) -> Origin {
        Origin {
            file: None,
            line,
            text: "@source:b.keys".into(),
        }
    }

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = StructuralError::ImportCycle {
            chain: vec!["/s/a.keys".into(), "/s/b.keys".into(), "/s/a.keys".into()],
            origin: origin(3),
        };
        assert_eq!(
            err.to_string(),
            "import cycle detected: /s/a.keys -> /s/b.keys -> /s/a.keys"
        );
        let diags = err.to_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, Some(3));
    }

    #[test]
    fn test_exit_codes() {
        let timeout = RunError::WaitTimeout {
            pattern: "$".into(),
            timeout: Duration::from_secs(30),
            origin: origin(1),
        };
        assert_eq!(timeout.exit_code(), EXIT_WAIT_TIMEOUT);
        let missing = RunError::MissingDependency {
            name: "termshot".into(),
            needed_by: "@record".into(),
        };
        assert_eq!(missing.exit_code(), 1);
    }
}
