use reeltty::{DirectiveKind, LoadError, Report, load_file, validate_file};
use std::fs;
use std::path::Path;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn invalid(err: LoadError) -> Report {
    match err {
        LoadError::Invalid(report) => report,
        other => panic!("expected invalid script, got {other:?}"),
    }
}

fn keys(dir: &Path, name: &str) -> Vec<String> {
    load_file(dir.join(name))
        .unwrap()
        .script
        .directives()
        .iter()
        .filter_map(|d| match &d.kind {
            DirectiveKind::Key(press) => Some(press.key.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_relative_paths_resolve_from_importing_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.keys", "start\n@source:lib/setup.keys\nend\n");
    write(dir.path(), "lib/setup.keys", "setup\n@source:common/login.keys\n");
    write(dir.path(), "lib/common/login.keys", "login\n");
    assert_eq!(keys(dir.path(), "main.keys"), ["start", "setup", "login", "end"]);
}

#[test]
fn test_import_cycle_reports_full_chain() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.keys", "@source:b.keys\n");
    write(dir.path(), "b.keys", "@source:c.keys\n");
    write(dir.path(), "c.keys", "x\n@source:a.keys\n");

    let report = invalid(load_file(dir.path().join("a.keys")).unwrap_err());
    let message = &report.errors().next().unwrap().message;
    assert!(message.starts_with("import cycle detected"), "{message}");
    let chain: Vec<&str> = message
        .trim_start_matches("import cycle detected: ")
        .split(" -> ")
        .collect();
    assert_eq!(chain.len(), 4, "{message}");
    assert_eq!(chain.first(), chain.last());
    assert!(chain[0].ends_with("a.keys"));
}

#[test]
fn test_self_import_is_a_cycle() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "loop.keys", "Enter\n@source:./loop.keys\n");
    let report = validate_file(dir.path().join("loop.keys")).unwrap();
    let error = report.errors().next().unwrap();
    assert!(error.message.contains("import cycle"), "{report}");
    assert_eq!(error.line, Some(2));
}

#[test]
fn test_depth_limit() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..12 {
        write(dir.path(), &format!("level{i}.keys"), &format!("@source:level{}.keys\n", i + 1));
    }
    write(dir.path(), "level12.keys", "Enter\n");
    let report = invalid(load_file(dir.path().join("level0.keys")).unwrap_err());
    assert!(
        report.errors().any(|d| d.message.contains("import depth limit of 10")),
        "{report}"
    );

    // Ten levels of nesting are fine.
    assert_eq!(keys(dir.path(), "level2.keys"), ["Enter"]);
}

#[test]
fn test_missing_import_lenient_only_when_validating() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.keys", "@source:generated.keys\n");

    let report = validate_file(dir.path().join("main.keys")).unwrap();
    assert!(!report.has_errors(), "{report}");

    let report = invalid(load_file(dir.path().join("main.keys")).unwrap_err());
    let message = &report.errors().next().unwrap().message;
    assert!(message.contains("generated.keys"), "{message}");
    assert!(message.contains("main.keys"), "{message}");
}

#[test]
fn test_errors_inside_imported_file_are_reported_with_its_name() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.keys", "@source:bad.keys\n");
    write(dir.path(), "bad.keys", "Enter\n@sleep:soon\n");
    let report = validate_file(dir.path().join("main.keys")).unwrap();
    let inner = report
        .errors()
        .find(|d| d.message.contains("sleep"))
        .unwrap();
    assert!(inner.file.as_deref().unwrap().ends_with("bad.keys"));
    assert_eq!(inner.line, Some(2));
}
