//! `@source:<path>`: inline another script file.
//!
//! Existence is only checked leniently here (a warning), since the target
//! may be generated by an earlier step. The import resolver is strict.

use crate::parser::LineCx;
use crate::script::DirectiveKind;
use std::path::{Path, PathBuf};

pub const NAME: &str = "source";

/// Conventional extension for script files.
pub const SCRIPT_EXTENSION: &str = "keys";

pub fn parse(args: Option<&str>, cx: &mut LineCx<'_>) -> Result<DirectiveKind, String> {
    let raw = super::required(args, "path in @source:<path>")?;
    if raw.contains('\0') {
        return Err("source path must not contain null bytes".to_string());
    }
    let path = PathBuf::from(raw);
    if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
        cx.warn(format!(
            "'{raw}' does not have the .{SCRIPT_EXTENSION} extension"
        ));
    }
    let resolved = match cx.base_dir {
        Some(base) => resolve_against(base, &path),
        None => path.clone(),
    };
    if !resolved.exists() {
        cx.warn(format!("source file '{}' not found", resolved.display()));
    }
    Ok(DirectiveKind::Source(path))
}

/// Resolve a `@source` path against the directory of the including file.
pub fn resolve_against(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_only_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let mut cx = LineCx::new(Some(dir.path()));
        let kind = parse(Some("later.keys"), &mut cx).unwrap();
        assert_eq!(kind, DirectiveKind::Source(PathBuf::from("later.keys")));
        assert_eq!(cx.warnings.len(), 1);
        assert!(cx.warnings[0].contains("not found"));
    }

    #[test]
    fn test_existing_file_relative_to_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("setup.keys"), "Enter\n").unwrap();
        let mut cx = LineCx::new(Some(dir.path()));
        parse(Some("setup.keys"), &mut cx).unwrap();
        assert!(cx.warnings.is_empty());
    }

    #[test]
    fn test_extension_warning_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("setup.txt"), "").unwrap();
        let mut cx = LineCx::new(Some(dir.path()));
        parse(Some("setup.txt"), &mut cx).unwrap();
        assert_eq!(cx.warnings.len(), 1);
        assert!(cx.warnings[0].contains(".keys extension"));

        assert!(parse(Some("bad\0path.keys"), &mut cx).unwrap_err().contains("null bytes"));
        assert!(parse(None, &mut cx).is_err());
    }

    #[test]
    fn test_resolve_against() {
        let base = Path::new("/scripts/lib");
        assert_eq!(
            resolve_against(base, Path::new("common.keys")),
            PathBuf::from("/scripts/lib/common.keys")
        );
        assert_eq!(
            resolve_against(base, Path::new("/abs/x.keys")),
            PathBuf::from("/abs/x.keys")
        );
    }
}
