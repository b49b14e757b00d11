//! Script data model: pre-processed source lines, typed directives and the
//! fully flattened [`Script`] the engine executes.

use crate::directives::{CaptureTarget, RecordControl, WaitPattern};
use crate::keys::KeyPress;
use crate::options::{OptionKey, OptionValue};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A non-blank script line with its comment removed.
///
/// `text` is what the parser sees; `raw` is the untouched original line and
/// is what diagnostics quote back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
    pub raw: String,
}

/// Split script content into [`SourceLine`]s.
///
/// Blank lines and comment-only lines are dropped. Line numbers are 1-based
/// and refer to the original content.
pub fn preprocess(content: &str) -> Vec<SourceLine> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let text = strip_inline_comment(raw.trim());
            (!text.is_empty()).then(|| SourceLine {
                number: idx + 1,
                text: text.to_string(),
                raw: raw.to_string(),
            })
        })
        .collect()
}

/// Strip a trailing comment from a line.
///
/// `#` starts a comment only at the start of the line or after whitespace, so
/// color values such as `@set:bar_color:#1e1e1e` survive intact.
pub(crate) fn strip_inline_comment(line: &str) -> &str {
    let mut prev_is_space = true;
    for (i, ch) in line.char_indices() {
        if ch == '#' && prev_is_space {
            return line[..i].trim_end();
        }
        prev_is_space = ch.is_whitespace();
    }
    line
}

/// Where a directive came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// `None` for inline scripts passed on the command line.
    pub file: Option<Arc<Path>>,
    pub line: usize,
    pub text: String,
}

impl Origin {
    pub fn new(file: Option<Arc<Path>>, line: &SourceLine) -> Self {
        Self {
            file,
            line: line.number,
            text: line.raw.trim().to_string(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file.display(), self.line),
            None => write!(f, "line {}", self.line),
        }
    }
}

/// A validated `@set:<key>:<value>` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    pub key: OptionKey,
    pub value: OptionValue,
}

/// One parsed unit of the script language.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveKind {
    Set(Setting),
    Sleep { ms: u64, capture: bool },
    Wait(WaitPattern),
    Capture(CaptureTarget),
    Record(RecordControl),
    Hide,
    Show,
    Frame,
    RepeatStart(u32),
    RepeatEnd,
    Require(String),
    Source(PathBuf),
    Pause,
    Key(KeyPress),
}

impl DirectiveKind {
    /// Directives that must be gone before a [`Script`] can exist.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Source(_) | Self::RepeatStart(_) | Self::RepeatEnd
        )
    }
}

/// A directive together with the line that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub origin: Origin,
}

/// An ordered, fully resolved directive sequence ready for execution.
///
/// Contains no `@source` or `@repeat`/`@end` nodes. Only the loader builds
/// one, after imports are inlined and loops unrolled.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    directives: Vec<Directive>,
    settings: BTreeMap<OptionKey, OptionValue>,
}

impl Script {
    pub(crate) fn new(directives: Vec<Directive>) -> Self {
        debug_assert!(directives.iter().all(|d| !d.kind.is_structural()));
        let settings = directives
            .iter()
            .filter_map(|d| match &d.kind {
                DirectiveKind::Set(setting) => Some((setting.key, setting.value.clone())),
                _ => None,
            })
            .collect();
        Self {
            directives,
            settings,
        }
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Final in-script value of each `@set` key (last assignment wins).
    pub fn settings(&self) -> &BTreeMap<OptionKey, OptionValue> {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}
