//! Script parser and validator for the `.keys` language.
//!
//! [`parse_str`] and [`parse_source`] classify every line as a directive or
//! a diagnostic. Parsing never stops at the first problem: the whole input is
//! checked and all findings are returned in one [`Report`].

use crate::diagnostic::{Diagnostic, Report};
use crate::directives::{capture, markers, record, repeat, require, set, sleep, source, wait};
use crate::keys;
use crate::script::{self, Directive, DirectiveKind, Origin, SourceLine};
use crate::suggest::suggest;
use std::path::Path;
use std::sync::Arc;

/// Per-line parsing context handed to each directive's parser.
#[derive(Debug)]
pub struct LineCx<'a> {
    /// Directory of the file being parsed; `None` for inline scripts.
    pub base_dir: Option<&'a Path>,
    pub(crate) warnings: Vec<String>,
}

impl<'a> LineCx<'a> {
    pub fn new(base_dir: Option<&'a Path>) -> Self {
        Self {
            base_dir,
            warnings: Vec::new(),
        }
    }

    /// Record a non-fatal finding for the current line.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// A directive parser: receives everything after `@name:` (or `None` when
/// the directive had no colon) and returns the typed directive or an error.
pub type ParseFn = fn(Option<&str>, &mut LineCx<'_>) -> Result<DirectiveKind, String>;

static REGISTRY: &[(&str, ParseFn)] = &[
    (set::NAME, set::parse),
    (sleep::NAME, sleep::parse),
    (wait::NAME, wait::parse),
    (capture::NAME, capture::parse),
    (record::NAME, record::parse),
    (markers::HIDE, markers::parse_hide),
    (markers::SHOW, markers::parse_show),
    (markers::FRAME, markers::parse_frame),
    (repeat::NAME, repeat::parse),
    (repeat::END, repeat::parse_end),
    (require::NAME, require::parse),
    (source::NAME, source::parse),
    (markers::PAUSE, markers::parse_pause),
];

/// Every directive name the parser understands.
pub fn directive_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

/// Directives and diagnostics produced from one piece of script text.
#[derive(Debug, Default)]
pub struct Parsed {
    pub directives: Vec<Directive>,
    pub report: Report,
}

/// Parse an inline script (no backing file).
///
/// # Example
///
/// ```
/// use reeltty::parse_str;
///
/// let parsed = parse_str("@set:cols:80\necho hi Enter\n@sleep:500\n");
/// assert!(!parsed.report.has_errors());
/// assert_eq!(parsed.directives.len(), 5);
/// ```
pub fn parse_str(content: &str) -> Parsed {
    parse_source(content, None, None)
}

/// Parse script text that came from `file`, resolving `@source` existence
/// checks against `base_dir`.
pub fn parse_source(content: &str, file: Option<Arc<Path>>, base_dir: Option<&Path>) -> Parsed {
    let mut parsed = Parsed::default();
    for line in script::preprocess(content) {
        let origin = Origin::new(file.clone(), &line);
        let mut cx = LineCx::new(base_dir);
        match parse_line(&line, &mut cx) {
            Ok(kinds) => parsed.directives.extend(kinds.into_iter().map(|kind| Directive {
                kind,
                origin: origin.clone(),
            })),
            Err(errors) => parsed
                .report
                .extend(errors.into_iter().map(|e| Diagnostic::error(&origin, e))),
        }
        parsed
            .report
            .extend(cx.warnings.into_iter().map(|w| Diagnostic::warning(&origin, w)));
    }
    parsed
}

/// Classify one pre-processed line.
///
/// Returns an empty list for lines that are accepted but produce nothing
/// (an unknown directive, which only warns).
fn parse_line(line: &SourceLine, cx: &mut LineCx<'_>) -> Result<Vec<DirectiveKind>, Vec<String>> {
    let Some(body) = line.text.strip_prefix('@') else {
        let presses = keys::parse_key_line(&line.text)?;
        return Ok(presses.into_iter().map(DirectiveKind::Key).collect());
    };
    let (name, args) = match body.split_once(':') {
        Some((name, args)) => (name, Some(args)),
        None => (body, None),
    };
    match REGISTRY.iter().find(|(known, _)| *known == name) {
        Some((_, parse)) => parse(args, cx).map(|kind| vec![kind]).map_err(|e| vec![e]),
        None => {
            match suggest(name, directive_names()) {
                Some(hint) => cx.warn(format!(
                    "unknown directive '@{name}' (did you mean '@{hint}'?); line ignored"
                )),
                None => cx.warn(format!("unknown directive '@{name}'; line ignored")),
            }
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPress;

    #[test]
    fn test_parse_str_mixed_script() {
        let parsed = parse_str(
            "# demo\n@set:cols:100\n@record:start\nls -la Enter\n@wait:/\\$ $/\n@frame\n@record:stop:demo.gif\n",
        );
        assert!(parsed.report.is_empty(), "{}", parsed.report);
        assert_eq!(parsed.directives.len(), 8);
        assert_eq!(
            parsed.directives[2].kind,
            DirectiveKind::Key(KeyPress::new("ls"))
        );
        assert_eq!(parsed.directives[2].origin.line, 4);
    }

    #[test]
    fn test_bad_sleep_option_reports_single_error() {
        let parsed = parse_str("@set:cols:80\n@sleep:100\n@sleep:100:foo");
        assert_eq!(parsed.report.error_count(), 1);
        let err = parsed.report.errors().next().unwrap();
        assert_eq!(err.line, Some(3));
        assert!(err.message.contains("unknown sleep option 'foo'"));
        assert_eq!(parsed.directives.len(), 2);
    }

    #[test]
    fn test_validation_is_exhaustive() {
        let parsed = parse_str("@sleep:x\n@wait:/open\n@set:speed:5\nEnter@\n@record:stop:a.mp4\n");
        assert_eq!(parsed.report.error_count(), 5);
        let lines: Vec<_> = parsed.report.errors().filter_map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unknown_directive_warns_with_suggestion() {
        let parsed = parse_str("@slep:100\n@teleport\n");
        assert!(!parsed.report.has_errors());
        let warnings: Vec<_> = parsed.report.warnings().map(|d| d.message.clone()).collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("did you mean '@sleep'"), "got: {}", warnings[0]);
        assert!(!warnings[1].contains("did you mean"));
        assert!(parsed.directives.is_empty());
    }

    #[test]
    fn test_key_line_errors_collected_per_token() {
        let parsed = parse_str("a@ b@x c\n");
        assert_eq!(parsed.report.error_count(), 2);
        assert!(parsed.report.errors().all(|d| d.line == Some(1)));
    }

    #[test]
    fn test_diagnostics_carry_file_and_text() {
        let file: Arc<Path> = Arc::from(Path::new("demo.keys"));
        let parsed = parse_source("\n@sleep:0  # oops\n", Some(file), None);
        let err = parsed.report.errors().next().unwrap();
        assert_eq!(err.line, Some(2));
        assert_eq!(err.text.as_deref(), Some("@sleep:0  # oops"));
        assert!(err.to_string().starts_with("error: demo.keys:2:"));
    }

    #[test]
    fn test_registry_names_are_unique() {
        let mut names: Vec<_> = directive_names().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), REGISTRY.len());
    }
}
