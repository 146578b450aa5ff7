//! Integration tests for the `craftdo` CLI.
//!
//! Each test creates a temp data directory, runs `craftdo` as a subprocess,
//! and verifies stdout and/or file contents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn craftdo_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_craftdo"))
}

/// Run `craftdo` against `dir`, returning (stdout, stderr, success).
fn run(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(craftdo_bin())
        .arg("--data-dir")
        .arg(dir)
        .args(args)
        .env_remove("CRAFTDO_DIR")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run craftdo");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `craftdo` expecting success, return stdout.
fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run(dir, args);
    if !success {
        panic!(
            "craftdo {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Run `craftdo` expecting failure, return stderr.
fn run_err(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run(dir, args);
    if success {
        panic!("craftdo {:?} unexpectedly succeeded:\nstdout: {}", args, stdout);
    }
    stderr
}

/// Add a task and return its full id
fn add(dir: &Path, name: &str, priority: &str) -> String {
    run_ok(dir, &["add", name, "-p", priority]).trim().to_string()
}

fn read_json(dir: &Path, file: &str) -> serde_json::Value {
    let text = fs::read_to_string(dir.join(file)).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[test]
fn test_add_and_list() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Mine diamonds", "5");
    assert_eq!(id.len(), 36);

    let out = run_ok(tmp.path(), &["list"]);
    assert!(out.contains(&id[..8]));
    assert!(out.contains("P5"));
    assert!(out.contains("Mine diamonds"));

    let tasks = read_json(tmp.path(), "tasks.json");
    assert_eq!(tasks[0]["name"], "Mine diamonds");
    assert_eq!(tasks[0]["priority"], 5);
    assert_eq!(tasks[0]["isDone"], false);
}

#[test]
fn test_list_empty() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["list"]);
    assert_eq!(out.trim(), "inventory is empty");
}

#[test]
fn test_list_json_sorted_by_priority() {
    let tmp = tempfile::TempDir::new().unwrap();
    add(tmp.path(), "low", "1");
    add(tmp.path(), "high", "5");
    add(tmp.path(), "mid", "3");

    let out = run_ok(tmp.path(), &["list", "--sort", "priority", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["high", "mid", "low"]);
    assert_eq!(json[0]["block"], "obsidian");

    // Sorting is a view; the file keeps insertion order
    let tasks = read_json(tmp.path(), "tasks.json");
    assert_eq!(tasks[0]["name"], "low");
}

#[test]
fn test_add_with_deadline() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_ok(tmp.path(), &["add", "Sleep", "--deadline", "+2h"]);
    let out = run_ok(tmp.path(), &["list", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json[0]["deadline_status"], "urgent");
    assert!(json[0]["deadline"].is_string());
}

#[test]
fn test_add_rejects_bad_input() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_err(tmp.path(), &["add", "x", "-p", "9"]);
    let err = run_err(tmp.path(), &["add", "x", "--deadline", "someday"]);
    assert!(err.contains("error:"));
    let err = run_err(tmp.path(), &["add", "   "]);
    assert!(err.contains("empty"));
}

#[test]
fn test_inventory_capacity() {
    let tmp = tempfile::TempDir::new().unwrap();
    for i in 0..27 {
        add(tmp.path(), &format!("task {i}"), "1");
    }
    let err = run_err(tmp.path(), &["add", "one too many"]);
    assert!(err.contains("inventory is full (27/27)"));
}

#[test]
fn test_edit() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Fish", "2");
    run_ok(tmp.path(), &["edit", &id[..8], "--name", "Go fishing", "-p", "4"]);

    let tasks = read_json(tmp.path(), "tasks.json");
    assert_eq!(tasks[0]["name"], "Go fishing");
    assert_eq!(tasks[0]["priority"], 4);
    assert_eq!(tasks[0]["id"], id.as_str());

    let err = run_err(tmp.path(), &["edit", &id[..8]]);
    assert!(err.contains("nothing to change"));
}

#[test]
fn test_rm_needs_confirmation() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Feed the cat", "1");

    // stdin is closed, so the prompt reads as "no"
    let out = run_ok(tmp.path(), &["rm", &id]);
    assert!(out.contains("aborted"));
    assert_eq!(read_json(tmp.path(), "tasks.json").as_array().unwrap().len(), 1);

    run_ok(tmp.path(), &["rm", &id, "-y"]);
    assert_eq!(read_json(tmp.path(), "tasks.json").as_array().unwrap().len(), 0);
}

#[test]
fn test_rm_prompt_does_not_hold_lock() {
    use std::io::{Read, Write};
    use std::process::Stdio;
    use std::time::Duration;

    use craftdo::io::lock::DataLock;

    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Build a boat", "2");

    let mut child = Command::new(craftdo_bin())
        .arg("--data-dir")
        .arg(tmp.path())
        .args(["rm", &id])
        .env_remove("CRAFTDO_DIR")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run craftdo");

    // Wait for the prompt, then take the lock the way a running TUI would
    let mut stderr = child.stderr.take().unwrap();
    let mut seen = Vec::new();
    let mut buf = [0u8; 64];
    while !String::from_utf8_lossy(&seen).contains("[y/N]") {
        let n = stderr.read(&mut buf).unwrap();
        assert!(n > 0, "prompt never shown");
        seen.extend_from_slice(&buf[..n]);
    }
    let lock = DataLock::acquire(tmp.path(), Duration::from_millis(200));
    assert!(lock.is_ok(), "lock held while waiting for an answer");
    drop(lock);

    child.stdin.take().unwrap().write_all(b"y\n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(read_json(tmp.path(), "tasks.json").as_array().unwrap().len(), 0);
}

#[test]
fn test_unknown_id() {
    let tmp = tempfile::TempDir::new().unwrap();
    let err = run_err(tmp.path(), &["done", "nope"]);
    assert!(err.contains("task not found"));
}

// ---------------------------------------------------------------------------
// Chest
// ---------------------------------------------------------------------------

#[test]
fn test_done_and_restore() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Smelt iron", "4");

    let out = run_ok(tmp.path(), &["done", &id[..8]]);
    assert_eq!(out.trim(), "mined Iron Ore Smelt iron");

    assert_eq!(read_json(tmp.path(), "tasks.json").as_array().unwrap().len(), 0);
    let completed = read_json(tmp.path(), "completed.json");
    assert_eq!(completed[0]["id"], id.as_str());
    assert_eq!(completed[0]["isDone"], true);
    assert!(completed[0]["completedAt"].is_string());

    let out = run_ok(tmp.path(), &["chest"]);
    assert!(out.contains("Smelt iron"));

    run_ok(tmp.path(), &["restore", &id[..8]]);
    let tasks = read_json(tmp.path(), "tasks.json");
    assert_eq!(tasks[0]["isDone"], false);
    assert_eq!(read_json(tmp.path(), "completed.json").as_array().unwrap().len(), 0);
}

#[test]
fn test_chest_capacity() {
    let tmp = tempfile::TempDir::new().unwrap();
    for i in 0..27 {
        let id = add(tmp.path(), &format!("task {i}"), "1");
        run_ok(tmp.path(), &["done", &id]);
    }
    let id = add(tmp.path(), "overflow", "1");
    let err = run_err(tmp.path(), &["done", &id]);
    assert!(err.contains("chest is full (27/27)"));

    // The task stays in the inventory
    let tasks = read_json(tmp.path(), "tasks.json");
    assert_eq!(tasks[0]["name"], "overflow");
}

#[test]
fn test_clear() {
    let tmp = tempfile::TempDir::new().unwrap();
    let err = run_err(tmp.path(), &["clear", "-y"]);
    assert!(err.contains("already empty"));

    for name in ["a", "b"] {
        let id = add(tmp.path(), name, "1");
        run_ok(tmp.path(), &["done", &id]);
    }
    let out = run_ok(tmp.path(), &["clear", "-y", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["cleared"], 2);
    assert_eq!(read_json(tmp.path(), "completed.json").as_array().unwrap().len(), 0);
}

#[test]
fn test_chest_rm() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = add(tmp.path(), "Trade", "2");
    run_ok(tmp.path(), &["done", &id]);
    run_ok(tmp.path(), &["chest-rm", &id, "-y"]);
    assert_eq!(read_json(tmp.path(), "completed.json").as_array().unwrap().len(), 0);
}

#[test]
fn test_stats() {
    let tmp = tempfile::TempDir::new().unwrap();
    add(tmp.path(), "a", "1");
    let id = add(tmp.path(), "b", "2");
    run_ok(tmp.path(), &["done", &id]);

    let out = run_ok(tmp.path(), &["stats"]);
    assert_eq!(
        out.trim(),
        "inventory 1/27 \u{b7} chest 1/27 \u{b7} overdue 0 \u{b7} urgent 0"
    );

    let out = run_ok(tmp.path(), &["stats", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["inventory"], 1);
    assert_eq!(json["chest"], 1);
    assert_eq!(json["limit"], 27);
}

// ---------------------------------------------------------------------------
// Files and config
// ---------------------------------------------------------------------------

#[test]
fn test_init_sample() {
    let tmp = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().join("data");
    let out = Command::new(craftdo_bin())
        .args(["init", "--sample", "--data-dir"])
        .arg(&dir)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(dir.join("config.toml").exists());
    assert_eq!(read_json(&dir, "tasks.json").as_array().unwrap().len(), 5);
}

#[test]
fn test_config_get_set() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_ok(tmp.path(), &["init"]);
    assert_eq!(run_ok(tmp.path(), &["config", "get", "tasks.default_sort"]).trim(), "none");

    run_ok(tmp.path(), &["config", "set", "tasks.default_sort", "priority"]);
    assert_eq!(
        run_ok(tmp.path(), &["config", "get", "tasks.default_sort"]).trim(),
        "priority"
    );
    // Comments from the template survive
    let text = fs::read_to_string(tmp.path().join("config.toml")).unwrap();
    assert!(text.contains("# craftdo configuration"));

    let err = run_err(tmp.path(), &["config", "set", "tasks.default_priority", "7"]);
    assert!(err.contains("tasks.default_priority"));
    run_err(tmp.path(), &["config", "get", "no.such.key"]);
}

#[test]
fn test_default_priority_from_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[tasks]\ndefault_priority = 5\n").unwrap();
    run_ok(tmp.path(), &["add", "Beacon"]);
    let tasks = read_json(tmp.path(), "tasks.json");
    assert_eq!(tasks[0]["priority"], 5);
}

#[test]
fn test_lenient_task_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(
        tmp.path().join("tasks.json"),
        r#"[{"name": "hand written", "priority": 9}]"#,
    )
    .unwrap();
    let out = run_ok(tmp.path(), &["list", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json[0]["priority"], 5);
    assert!(json[0]["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[test]
fn test_corrupt_file_is_an_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("tasks.json"), "{not json").unwrap();
    let err = run_err(tmp.path(), &["list"]);
    assert!(err.contains("tasks.json"));
}
