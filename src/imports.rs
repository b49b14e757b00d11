//! Import resolution: inline every `@source` with the directives of the
//! referenced file, recursively.
//!
//! Relative paths resolve against the directory of the file that contains the
//! `@source` line, so a tree of scripts can be moved as a unit. The chain of
//! files being expanded travels down the recursion as an [`ImportContext`]
//! value; nothing is shared between sibling imports.

use crate::diagnostic::Report;
use crate::directives::source::resolve_against;
use crate::error::StructuralError;
use crate::parser;
use crate::script::{Directive, DirectiveKind, Origin};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maximum nesting of `@source` below the top-level script.
pub const MAX_IMPORT_DEPTH: usize = 10;

/// How strictly a missing `@source` target is treated.
///
/// Syntax checking tolerates files that an earlier step may still generate;
/// actual execution needs the file to be there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Skip missing targets; the parser has already warned about them.
    Validate,
    /// A missing target is a [`StructuralError::MissingImport`].
    Execute,
}

/// The files currently being expanded, outermost first.
#[derive(Debug, Clone, Default)]
pub struct ImportContext {
    chain: Vec<PathBuf>,
    depth: usize,
}

impl ImportContext {
    /// Context for a top-level script. Inline scripts have no file.
    pub fn root(file: Option<PathBuf>) -> Self {
        Self {
            chain: file.into_iter().collect(),
            depth: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn enter(&self, path: PathBuf) -> Self {
        let mut chain = self.chain.clone();
        chain.push(path);
        Self {
            chain,
            depth: self.depth + 1,
        }
    }

    /// The cycle closed by importing `path`, if any: the chain from the first
    /// occurrence of `path` followed by `path` again.
    fn cycle_with(&self, path: &Path) -> Option<Vec<PathBuf>> {
        let start = self.chain.iter().position(|p| p == path)?;
        let mut cycle = self.chain[start..].to_vec();
        cycle.push(path.to_path_buf());
        Some(cycle)
    }
}

/// Directives with every `@source` inlined, plus warnings from imported files.
#[derive(Debug, Default)]
pub struct Resolution {
    pub directives: Vec<Directive>,
    pub report: Report,
}

/// Replace every `@source` in `directives` with the resolved contents of its
/// target.
///
/// In [`ResolveMode::Validate`] a failing import is recorded in the
/// returned report and resolution moves on to the next directive, so every
/// bad import is reported. [`ResolveMode::Execute`] stops at the first one.
pub fn resolve(
    directives: Vec<Directive>,
    base_dir: &Path,
    ctx: &ImportContext,
    mode: ResolveMode,
) -> Result<Resolution, StructuralError> {
    let mut out = Resolution::default();
    for directive in directives {
        let DirectiveKind::Source(path) = &directive.kind else {
            out.directives.push(directive);
            continue;
        };
        let target = resolve_against(base_dir, path);
        match import(target, directive.origin, base_dir, ctx, mode) {
            Ok(Some(nested)) => {
                out.directives.extend(nested.directives);
                out.report.extend(nested.report.into_diagnostics());
            }
            Ok(None) => {}
            Err(err) if mode == ResolveMode::Validate => out.report.extend(err.to_diagnostics()),
            Err(err) => return Err(err),
        }
    }
    Ok(out)
}

/// Resolve one `@source` target. `None` when a missing target is tolerated.
fn import(
    target: PathBuf,
    origin: Origin,
    base_dir: &Path,
    ctx: &ImportContext,
    mode: ResolveMode,
) -> Result<Option<Resolution>, StructuralError> {
    if !target.exists() {
        return match mode {
            ResolveMode::Validate => Ok(None),
            ResolveMode::Execute => Err(StructuralError::MissingImport {
                missing: target,
                origin,
            }),
        };
    }
    let canonical = std::fs::canonicalize(&target).map_err(|source| StructuralError::ReadImport {
        path: target.clone(),
        source,
        origin: origin.clone(),
    })?;
    if let Some(chain) = ctx.cycle_with(&canonical) {
        return Err(StructuralError::ImportCycle { chain, origin });
    }
    if ctx.depth() >= MAX_IMPORT_DEPTH {
        return Err(StructuralError::ImportDepthExceeded {
            path: canonical,
            limit: MAX_IMPORT_DEPTH,
            origin,
        });
    }

    let content =
        std::fs::read_to_string(&canonical).map_err(|source| StructuralError::ReadImport {
            path: canonical.clone(),
            source,
            origin: origin.clone(),
        })?;
    let import_dir = canonical
        .parent()
        .map_or_else(|| base_dir.to_path_buf(), Path::to_path_buf);
    let parsed = parser::parse_source(
        &content,
        Some(Arc::from(canonical.as_path())),
        Some(&import_dir),
    );
    let mut out = Resolution::default();
    if parsed.report.has_errors() {
        let err = StructuralError::InvalidImport {
            path: canonical.clone(),
            diagnostics: parsed.report,
            origin,
        };
        if mode == ResolveMode::Execute {
            return Err(err);
        }
        out.report.extend(err.to_diagnostics());
    } else {
        out.report.extend(parsed.report.into_diagnostics());
    }
    tracing::debug!(path = %canonical.display(), depth = ctx.depth() + 1, "importing script");

    let nested = resolve(parsed.directives, &import_dir, &ctx.enter(canonical), mode)?;
    out.directives = nested.directives;
    out.report.extend(nested.report.into_diagnostics());
    Ok(Some(out))
}
