//! Integration tests for the `chore` CLI.
//!
//! Each test creates a temp workspace, runs `chore` as a subprocess,
//! and verifies stdout and/or stored data.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use std::io::Write;

use chore::io::lock::{DEFAULT_LOCK_TIMEOUT, DocumentLock};

/// Get the path to the built `chore` binary.
fn chore_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("chore");
    path
}

/// Run `chore` with the given args in the given directory, returning (stdout, stderr, success).
fn run_chore(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(chore_bin())
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .expect("failed to run chore");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `chore` expecting success, return stdout.
fn run_chore_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_chore(dir, args);
    if !success {
        panic!(
            "chore {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Run `chore` expecting success and parse stdout as JSON.
fn run_chore_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let out = run_chore_ok(dir, args);
    serde_json::from_str(&out).unwrap_or_else(|e| panic!("bad JSON from {:?}: {}\n{}", args, e, out))
}

/// Titles of the listed items, in display order
fn titles(list: &serde_json::Value) -> Vec<String> {
    list["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap().to_string())
        .collect()
}

fn init_local(root: &Path) {
    run_chore_ok(root, &["init"]);
}

/// Add an item and return its id
fn add(root: &Path, title: &str) -> String {
    let item = run_chore_json(root, &["add", title, "--json"]);
    item["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_workspace() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_chore_ok(tmp.path(), &["init"]);
    assert!(out.contains("Initialized chore workspace"));
    assert!(out.contains("backend: local"));

    let config = fs::read_to_string(tmp.path().join(".chore/config.toml")).unwrap();
    assert!(config.contains("backend = \"local\""));

    // A second init refuses without --force
    let (_, stderr, success) = run_chore(tmp.path(), &["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));
    run_chore_ok(tmp.path(), &["init", "--force"]);
}

#[test]
fn test_commands_outside_workspace_fail() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_chore(tmp.path(), &["list"]);
    assert!(!success);
    assert!(stderr.contains("chore init"));
}

#[test]
fn test_workspace_dir_flag() {
    let tmp = tempfile::TempDir::new().unwrap();
    let elsewhere = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());

    let dir = tmp.path().to_str().unwrap();
    run_chore_ok(elsewhere.path(), &["-C", dir, "add", "Buy milk"]);
    let list = run_chore_json(elsewhere.path(), &["-C", dir, "list", "--json"]);
    assert_eq!(titles(&list), vec!["Buy milk"]);
}

// ---------------------------------------------------------------------------
// Local backend
// ---------------------------------------------------------------------------

#[test]
fn test_add_and_list() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());

    let out = run_chore_ok(tmp.path(), &["add", "  Buy", "milk  "]);
    assert!(out.starts_with("added: [ ] "));
    assert!(out.contains("Buy milk"));

    let out = run_chore_ok(tmp.path(), &["list"]);
    assert!(out.contains("Buy milk"));
    assert!(out.trim_end().ends_with("1 item left"));

    // The list lives under the configured key
    let stored = fs::read_to_string(tmp.path().join(".chore/todo-items-v1.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored[0]["title"], "Buy milk");
    assert_eq!(stored[0]["completed"], false);
}

#[test]
fn test_add_blank_title_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());

    let (_, stderr, success) = run_chore(tmp.path(), &["add", "   "]);
    assert!(!success);
    assert!(stderr.contains("title is empty"));
    assert!(!tmp.path().join(".chore/todo-items-v1.json").exists());
}

#[test]
fn test_list_json_counts_and_filters() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());
    let milk = add(tmp.path(), "Buy milk");
    add(tmp.path(), "Walk dog");
    run_chore_ok(tmp.path(), &["done", &milk]);

    let all = run_chore_json(tmp.path(), &["list", "--json"]);
    assert_eq!(all["filter"], "all");
    assert_eq!(all["total"], 2);
    assert_eq!(all["activeCount"], 1);

    let completed = run_chore_json(tmp.path(), &["list", "-f", "completed", "--json"]);
    assert_eq!(titles(&completed), vec!["Buy milk"]);
    // activeCount covers the whole list, not the filtered rows
    assert_eq!(completed["activeCount"], 1);

    let active = run_chore_json(tmp.path(), &["list", "--filter", "active", "--json"]);
    assert_eq!(titles(&active), vec!["Walk dog"]);
}

#[test]
fn test_done_undone_by_prefix() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());
    let id = add(tmp.path(), "Buy milk");

    let item = run_chore_json(tmp.path(), &["done", &id[..id.len() - 2], "--json"]);
    assert_eq!(item["id"], id.as_str());
    assert_eq!(item["completed"], true);

    let item = run_chore_json(tmp.path(), &["undone", &id, "--json"]);
    assert_eq!(item["completed"], false);

    let (_, stderr, success) = run_chore(tmp.path(), &["done", "nope"]);
    assert!(!success);
    assert!(stderr.contains("no item matches 'nope'"));
}

#[test]
fn test_edit() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());
    let id = add(tmp.path(), "Buy milk");

    let item = run_chore_json(tmp.path(), &["edit", &id, "Buy", "oat", "milk", "--json"]);
    assert_eq!(item["title"], "Buy oat milk");

    let (_, _, success) = run_chore(tmp.path(), &["edit", &id, " "]);
    assert!(!success);
    let list = run_chore_json(tmp.path(), &["list", "--json"]);
    assert_eq!(titles(&list), vec!["Buy oat milk"]);
}

#[test]
fn test_rm_resolves_all_before_deleting() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());
    let a = add(tmp.path(), "One");
    let b = add(tmp.path(), "Two");

    let (_, _, success) = run_chore(tmp.path(), &["rm", &a, "missing"]);
    assert!(!success);
    let list = run_chore_json(tmp.path(), &["list", "--json"]);
    assert_eq!(list["total"], 2);

    let out = run_chore_json(tmp.path(), &["rm", &a, &b, &a, "--json"]);
    assert_eq!(out["removed"], 2);
    let list = run_chore_json(tmp.path(), &["list", "--json"]);
    assert_eq!(list["total"], 0);
}

#[test]
fn test_clear_completed() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());
    let a = add(tmp.path(), "One");
    add(tmp.path(), "Two");
    let c = add(tmp.path(), "Three");
    run_chore_ok(tmp.path(), &["done", &a]);
    run_chore_ok(tmp.path(), &["done", &c]);

    let out = run_chore_ok(tmp.path(), &["clear-completed"]);
    assert_eq!(out.trim(), "removed 2 items");
    let list = run_chore_json(tmp.path(), &["list", "--json"]);
    assert_eq!(titles(&list), vec!["Two"]);

    let out = run_chore_ok(tmp.path(), &["clear-completed"]);
    assert_eq!(out.trim(), "removed 0 items");
}

#[test]
fn test_clear_all_requires_confirmation() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());
    add(tmp.path(), "One");
    add(tmp.path(), "Two");

    // stdin is closed, so the prompt reads no answer
    let (_, stderr, success) = run_chore(tmp.path(), &["clear-all"]);
    assert!(!success);
    assert!(stderr.contains("Delete all 2 items? [y/N]"));
    assert!(stderr.contains("cancelled"));

    let mut child = Command::new(chore_bin())
        .args(["clear-all"])
        .current_dir(tmp.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"y\n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "removed 2 items");

    // Empty list: nothing to confirm
    let out = run_chore_ok(tmp.path(), &["clear-all"]);
    assert_eq!(out.trim(), "removed 0 items");
}

#[test]
fn test_clear_all_yes() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());
    add(tmp.path(), "One");

    let out = run_chore_json(tmp.path(), &["clear-all", "--yes", "--json"]);
    assert_eq!(out["removed"], 1);
    let stored = fs::read_to_string(tmp.path().join(".chore/todo-items-v1.json")).unwrap();
    assert_eq!(stored.trim(), "[]");
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

#[test]
fn test_backend_switch_keeps_lists_separate() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());
    add(tmp.path(), "Local item");

    let out = run_chore_ok(tmp.path(), &["backend", "remote"]);
    assert_eq!(out.trim(), "backend: remote");
    let config = fs::read_to_string(tmp.path().join(".chore/config.toml")).unwrap();
    assert!(config.contains("backend = \"remote\""));
    // Comments survive the edit
    assert!(config.contains("# chore workspace configuration"));

    let list = run_chore_json(tmp.path(), &["list", "--json"]);
    assert_eq!(list["total"], 0);
    add(tmp.path(), "Remote item");

    let list = run_chore_json(tmp.path(), &["--backend", "local", "list", "--json"]);
    assert_eq!(titles(&list), vec!["Local item"]);
    let list = run_chore_json(tmp.path(), &["list", "--json"]);
    assert_eq!(titles(&list), vec!["Remote item"]);
}

#[test]
fn test_remote_workspaces_share_one_list() {
    let a = tempfile::TempDir::new().unwrap();
    let b = tempfile::TempDir::new().unwrap();
    let shared = tempfile::TempDir::new().unwrap();
    let db = shared.path().join("realtime.json");

    for root in [a.path(), b.path()] {
        run_chore_ok(root, &["--backend", "remote", "init"]);
        let config_path = root.join(".chore/config.toml");
        let config = fs::read_to_string(&config_path).unwrap().replace(
            "database = \"realtime.json\"",
            &format!("database = {:?}", db.to_str().unwrap()),
        );
        fs::write(&config_path, config).unwrap();
    }

    let id = add(a.path(), "Buy milk");
    let list = run_chore_json(b.path(), &["list", "--json"]);
    assert_eq!(titles(&list), vec!["Buy milk"]);

    run_chore_ok(b.path(), &["done", &id]);
    let list = run_chore_json(a.path(), &["list", "-f", "completed", "--json"]);
    assert_eq!(titles(&list), vec!["Buy milk"]);

    // Items live as children of the collection, keyed by id
    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&db).unwrap()).unwrap();
    assert_eq!(doc["todos"][id.as_str()]["title"], "Buy milk");
    assert_eq!(doc["todos"][id.as_str()]["completed"], true);

    run_chore_ok(a.path(), &["clear-completed"]);
    let list = run_chore_json(b.path(), &["list", "--json"]);
    assert_eq!(list["total"], 0);
}

#[test]
fn test_failed_remote_add_is_not_reported_as_added() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_chore_ok(tmp.path(), &["--backend", "remote", "init"]);
    let first = add(tmp.path(), "Buy milk");

    // Another writer holds the document lock for longer than add waits
    let db = tmp.path().join(".chore/realtime.json");
    let held = DocumentLock::acquire(&db, DEFAULT_LOCK_TIMEOUT).unwrap();
    let (stdout, stderr, success) = run_chore(tmp.path(), &["add", "Buy milk"]);
    drop(held);

    assert!(!success, "add reported success: {}", stdout);
    assert!(!stdout.contains(&first));
    assert!(stderr.contains("could not be saved"));

    let list = run_chore_json(tmp.path(), &["list", "--json"]);
    assert_eq!(list["total"], 1);
    let entries = run_chore_json(tmp.path(), &["recovery", "--json"]);
    assert_eq!(entries[0]["category"], "remote");
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[test]
fn test_corrupt_list_is_logged() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());
    fs::write(tmp.path().join(".chore/todo-items-v1.json"), "{not json").unwrap();

    let list = run_chore_json(tmp.path(), &["list", "--json"]);
    assert_eq!(list["total"], 0);

    let entries = run_chore_json(tmp.path(), &["recovery", "--json"]);
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["category"], "parser");
    assert!(entries[0]["body"].as_str().unwrap().contains("{not json"));

    let path = run_chore_ok(tmp.path(), &["recovery", "path"]);
    assert!(path.trim().ends_with(".recovery.log"));
}

#[test]
fn test_recovery_empty() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_local(tmp.path());
    let out = run_chore_ok(tmp.path(), &["recovery"]);
    assert_eq!(out.trim(), "No recovery entries.");
}
