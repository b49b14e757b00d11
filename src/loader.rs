//! Turn script text into an executable [`Script`].
//!
//! Loading runs the parser, the import resolver and the loop expander in
//! that order. Every stage reports into the same [`Report`], so a
//! validate-only run shows line errors and structural errors together.

use crate::diagnostic::Report;
use crate::imports::{self, ImportContext, ResolveMode};
use crate::parser;
use crate::repeat;
use crate::script::{Directive, Script};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read script file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("script is invalid: {} error(s)", .0.error_count())]
    Invalid(Report),
}

/// A loaded script together with the warnings found while loading it.
#[derive(Debug)]
pub struct Loaded {
    pub script: Script,
    pub report: Report,
}

/// Check an inline script without executing it.
pub fn validate_str(content: &str) -> Report {
    match assemble(content, None, ResolveMode::Validate) {
        Ok((_, report)) | Err(report) => report,
    }
}

/// Check a script file without executing it.
///
/// `@source` targets that do not exist yet are only warned about.
pub fn validate_file(path: impl AsRef<Path>) -> Result<Report, LoadError> {
    let path = path.as_ref();
    let content = read(path)?;
    Ok(match assemble(&content, Some(path), ResolveMode::Validate) {
        Ok((_, report)) | Err(report) => report,
    })
}

/// Load an inline script for execution.
pub fn load_str(content: &str) -> Result<Loaded, LoadError> {
    into_loaded(assemble(content, None, ResolveMode::Execute))
}

/// Load a script file for execution. Every `@source` target must exist.
pub fn load_file(path: impl AsRef<Path>) -> Result<Loaded, LoadError> {
    let path = path.as_ref();
    let content = read(path)?;
    into_loaded(assemble(&content, Some(path), ResolveMode::Execute))
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn into_loaded(result: Result<(Vec<Directive>, Report), Report>) -> Result<Loaded, LoadError> {
    let (directives, report) = result.map_err(LoadError::Invalid)?;
    Ok(Loaded {
        script: Script::new(directives),
        report,
    })
}

/// Parse, resolve and expand. `Err` carries a report with at least one error.
fn assemble(
    content: &str,
    file: Option<&Path>,
    mode: ResolveMode,
) -> Result<(Vec<Directive>, Report), Report> {
    let canonical = file.and_then(|f| std::fs::canonicalize(f).ok());
    let base_dir = match canonical.as_deref().and_then(Path::parent) {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let parsed = parser::parse_source(content, file.map(Arc::from), Some(&base_dir));
    let mut report = parsed.report;

    let ctx = ImportContext::root(canonical);
    let directives = match imports::resolve(parsed.directives.clone(), &base_dir, &ctx, mode) {
        Ok(resolution) => {
            report.extend(resolution.report.into_diagnostics());
            resolution.directives
        }
        Err(err) => {
            report.extend(err.to_diagnostics());
            // Still check loop pairing in the top-level file.
            parsed.directives
        }
    };

    for err in repeat::check(&directives) {
        report.extend(err.to_diagnostics());
    }
    if report.has_errors() {
        return Err(report);
    }
    match repeat::expand(directives) {
        Ok(expanded) => Ok((expanded, report)),
        Err(err) => {
            report.extend(err.to_diagnostics());
            Err(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_str_flattens_script() {
        let loaded = load_str("@repeat:2\nUp\n@end\nEnter\n").unwrap();
        assert_eq!(loaded.script.len(), 3);
        assert!(loaded.report.is_empty());
    }

    #[test]
    fn test_validate_collects_line_and_structural_errors() {
        let report = validate_str("@sleep:abc\n@repeat:2\n@repeat:3\n@end\n@end\n");
        assert_eq!(report.error_count(), 2);
        let lines: Vec<_> = report.errors().filter_map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn test_load_rejects_invalid_script() {
        let err = load_str("@sleep:-1\n").unwrap_err();
        let LoadError::Invalid(report) = err else {
            panic!("expected invalid, got {err:?}");
        };
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_missing_source_validate_vs_load() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.keys");
        fs::write(&main, "@source:later.keys\nEnter\n").unwrap();

        let report = validate_file(&main).unwrap();
        assert!(!report.has_errors(), "{report}");
        assert_eq!(report.warnings().count(), 1);

        let err = load_file(&main).unwrap_err();
        let LoadError::Invalid(report) = err else {
            panic!("expected invalid, got {err:?}");
        };
        assert!(report.errors().any(|d| d.message.contains("not found")));
    }

    #[test]
    fn test_repeat_may_span_imports() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.keys"), "@repeat:2\n@source:body.keys\n@end\n").unwrap();
        fs::write(dir.path().join("body.keys"), "a b\n").unwrap();
        let loaded = load_file(dir.path().join("main.keys")).unwrap();
        assert_eq!(loaded.script.len(), 4);
    }

    #[test]
    fn test_validate_reports_errors_in_every_import() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.keys");
        fs::write(&main, "@source:a.keys\n@source:b.keys\n@sleep:bad\n").unwrap();
        fs::write(dir.path().join("a.keys"), "@sleep:soon\n").unwrap();
        fs::write(dir.path().join("b.keys"), "@sleep:later\n").unwrap();

        let report = validate_file(&main).unwrap();
        let located: Vec<_> = report
            .errors()
            .filter_map(|d| {
                let name = d.file.as_deref()?.file_name()?.to_str()?.to_string();
                Some((name, d.line?))
            })
            .collect();
        for expected in [("main.keys", 3), ("a.keys", 1), ("b.keys", 1)] {
            assert!(
                located.iter().any(|(f, l)| (f.as_str(), *l) == expected),
                "{expected:?} missing from {report}"
            );
        }

        // Loading stops at the first bad import.
        let err = load_file(&main).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
    }

    #[test]
    fn test_unreadable_file() {
        let err = validate_file("/definitely/not/here.keys").unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }
}
