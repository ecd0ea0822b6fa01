//! CLI integration tests
//!
//! Drive the built binary against batch, entry and directory files in a
//! scratch directory.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const ACCOUNT: &str = r#"{
  "kind": "account",
  "id": "acct-1",
  "name": "a@x.com",
  "attrs": { "mailAlias": ["b@x.com"], "aggregateQuota": "500" }
}"#;

const DIRECTORY: &str = r#"{
  "entries": [
    { "kind": "domain", "id": "dom-1", "name": "x.com", "attrs": { "domainAggregateQuota": "1000" } },
    { "kind": "cos", "id": "cos-1", "name": "default" }
  ]
}"#;

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_provgate"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI")
}

fn check(dir: &TempDir, batch: &str, extra: &[&str]) -> Output {
    let batch = write(dir, "batch.json", batch);
    let entry = write(dir, "entry.json", ACCOUNT);
    let directory = write(dir, "directory.json", DIRECTORY);
    let mut args = vec![
        "check",
        "--batch",
        batch.to_str().unwrap(),
        "--directory",
        directory.to_str().unwrap(),
    ];
    if !extra.contains(&"--create") {
        args.push("--entry");
        args.push(entry.to_str().unwrap());
    }
    args.extend_from_slice(extra);
    run(&args)
}

#[test]
fn test_check_prints_canonical_batch() {
    // GIVEN an account and a batch adding a Unicode alias
    let dir = TempDir::new().unwrap();

    // WHEN the batch is checked
    let output = check(&dir, r#"{"+mailAlias": ["c@bücher.example"]}"#, &[]);

    // THEN it succeeds and prints the encoded batch
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        printed,
        serde_json::json!({ "+mailAlias": ["c@xn--bcher-kva.example"] })
    );
}

#[test]
fn test_check_rejection_exits_nonzero_with_code() {
    let dir = TempDir::new().unwrap();

    let output = check(&dir, r#"{"allowFromAddress": ["a@x.com", "c@x.com"]}"#, &[]);

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERR_INVALID_REQUEST"), "stderr: {}", stderr);
    assert!(stderr.contains("c@x.com"), "stderr: {}", stderr);
}

#[test]
fn test_check_create_uses_declared_name() {
    // GIVEN an account being created in x.com (domain quota 1000)
    let dir = TempDir::new().unwrap();

    // WHEN its aggregate quota exceeds the domain's
    let output = check(
        &dir,
        r#"{"aggregateQuota": "5000"}"#,
        &["--create", "new@x.com"],
    );

    // THEN the domain bound rejects it
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("domainAggregateQuota"), "stderr: {}", stderr);
}

#[test]
fn test_check_unknown_cos_not_found() {
    let dir = TempDir::new().unwrap();

    let output = check(&dir, r#"{"cosId": "cos-404"}"#, &[]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_NOT_FOUND"));
}

#[test]
fn test_check_malformed_batch_fails() {
    let dir = TempDir::new().unwrap();

    let output = check(&dir, r#"["not", "a", "map"]"#, &[]);

    assert!(!output.status.success());
}

#[test]
fn test_attrs_lists_catalogue() {
    let output = run(&["attrs"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let quota = stdout
        .lines()
        .find(|l| l.starts_with("mailQuota "))
        .expect("mailQuota listed");
    assert!(quota.contains("long"));
    assert!(quota.contains("quota_hierarchy"));
    assert!(stdout
        .lines()
        .any(|l| l.starts_with("domainName ") && l.contains("immutable")));
}

#[test]
fn test_attrs_with_custom_catalogue() {
    let dir = TempDir::new().unwrap();
    let catalogue = write(
        &dir,
        "catalogue.toml",
        r#"
        [[attribute]]
        name = "nickname"
        type = "string"
        max_length = 8
        "#,
    );

    let output = run(&["attrs", "--catalogue", catalogue.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.starts_with("nickname"));
}
