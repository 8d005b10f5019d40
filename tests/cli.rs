//! Command-line replay tests

use std::path::Path;

use clap::Parser;
use sprig::cli::{run, CliArgs};

const SCRIPT: &str = r#"
- op: insert
  text: "("
- op: insert
  text: "2"
- op: insert
  text: ")"
- op: set_offset
  offset: 99
- op: home
"#;

fn args(file: &Path, extra: &[&str]) -> CliArgs {
    let missing_config = file.with_file_name("no-such-config.yaml");
    let mut argv = vec![
        "sprig".to_string(),
        file.display().to_string(),
        "--config".to_string(),
        missing_config.display().to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    CliArgs::parse_from(argv)
}

#[test]
fn test_replay_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("sum.sp");
    let script = dir.path().join("edits.yaml");
    std::fs::write(&file, "1 + ").unwrap();
    std::fs::write(&script, SCRIPT).unwrap();

    let output = run(&args(
        &file,
        &["--offset", "4", "--script", &script.display().to_string(), "--json"],
    ))
    .unwrap();
    let summary: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(summary["code"], "1 + (2)");
    assert_eq!(summary["offset"], 0);
    assert_eq!(summary["line"], 0);
    assert_eq!(summary["column"], 0);
    assert!(summary["selection"].is_null());
    assert_eq!(summary["applied"], 4);
    assert_eq!(summary["skipped"], 1);

    // Without --write the file is left alone
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "1 + ");
}

#[test]
fn test_write_saves_edited_text() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("sum.sp");
    let script = dir.path().join("edits.yaml");
    std::fs::write(&file, "1 + ").unwrap();
    std::fs::write(&script, SCRIPT).unwrap();

    let output = run(&args(
        &file,
        &["--offset", "4", "--script", &script.display().to_string(), "--write"],
    ))
    .unwrap();
    assert_eq!(output, "1 + (2)");
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "1 + (2)");
}

#[test]
fn test_no_script_echoes_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("plain.sp");
    std::fs::write(&file, "a: [1 2]\n").unwrap();
    assert_eq!(run(&args(&file, &[])).unwrap(), "a: [1 2]\n");
}

#[test]
fn test_errors_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("missing.sp");
    let err = run(&args(&file, &[])).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));

    std::fs::write(&file, "1").unwrap();
    let script = dir.path().join("bad.yaml");
    std::fs::write(&script, "- op: fly\n").unwrap();
    let err = run(&args(&file, &["--script", &script.display().to_string()])).unwrap_err();
    assert!(err.to_string().contains("Failed to parse script"));
}
