//! Drives the `recaller` binary end to end with an isolated home
//! directory per test.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::TempDir;

fn recaller_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("recaller");
    path
}

fn run_recaller(home: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = recaller_binary();
    let output = Command::new(&binary)
        .args(args)
        .env("HOME", home)
        .env("SHELL", "/bin/bash")
        .output()
        .unwrap_or_else(|e| panic!("failed to run recaller binary at {binary:?}: {e}"));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn enable_filesystem(home: &Path) {
    fs::write(
        home.join(".recaller.toml"),
        "[filesystem]\nenabled = true\n",
    )
    .unwrap();
}

#[test]
fn history_ranks_commands_from_bash_history() {
    let home = TempDir::new().unwrap();
    let now = now_epoch();
    fs::write(
        home.path().join(".bash_history"),
        format!(
            "#{}\ngit status\n#{}\ngit status\n#{}\ngit commit\n#{}\nls -la\n",
            now - 3600,
            now - 60,
            now - 7200,
            now - 30,
        ),
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_recaller(home.path(), &["history", "--match", "git"]);
    assert!(success, "history failed: {stderr}");

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["git status", "git commit"]);
}

#[test]
fn history_fuzzy_matching_is_on_by_default() {
    let home = TempDir::new().unwrap();
    let now = now_epoch();
    fs::write(
        home.path().join(".bash_history"),
        format!("#{}\ngit commit --amend\n", now - 60),
    )
    .unwrap();

    let (stdout, _, success) = run_recaller(home.path(), &["history", "--match", "amend"]);
    assert!(success);
    assert!(stdout.contains("git commit --amend"));
}

#[test]
fn fs_commands_require_opt_in() {
    let home = TempDir::new().unwrap();
    let (_, stderr, success) = run_recaller(home.path(), &["fs", "index", "."]);
    assert!(!success);
    assert!(stderr.contains("filesystem search is disabled"));
}

#[test]
fn fs_index_then_search_finds_files() {
    let home = TempDir::new().unwrap();
    enable_filesystem(home.path());

    let data = home.path().join("notes");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("alpha-notes.txt"), "alpha").unwrap();
    fs::write(data.join("beta-notes.txt"), "beta").unwrap();

    let (stdout, stderr, success) =
        run_recaller(home.path(), &["fs", "index", data.to_str().unwrap()]);
    assert!(success, "index failed: {stderr}");
    assert!(stdout.contains("index:"));
    assert!(home.path().join(".recaller_fs_index.bin").exists());

    let (stdout, stderr, success) = run_recaller(home.path(), &["fs", "search", "alpha"]);
    assert!(success, "search failed: {stderr}");
    assert!(stdout.contains("alpha-notes.txt"));
    assert!(!stdout.contains("beta-notes.txt"));
}

#[test]
fn fs_search_reports_an_empty_index() {
    let home = TempDir::new().unwrap();
    enable_filesystem(home.path());

    let (stdout, _, success) = run_recaller(home.path(), &["fs", "search", "anything"]);
    assert!(success);
    assert!(stdout.contains("index is empty"));
}

#[test]
fn fs_clean_removes_stale_entries() {
    let home = TempDir::new().unwrap();
    enable_filesystem(home.path());

    let data = home.path().join("docs");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("keep.txt"), "x").unwrap();
    fs::write(data.join("gone.txt"), "x").unwrap();

    let (_, stderr, success) =
        run_recaller(home.path(), &["fs", "index", data.to_str().unwrap()]);
    assert!(success, "index failed: {stderr}");

    fs::remove_file(data.join("gone.txt")).unwrap();

    let (stdout, stderr, success) = run_recaller(home.path(), &["fs", "clean", "--stale"]);
    assert!(success, "clean failed: {stderr}");
    assert!(stdout.contains("stale removed:   1"));

    let (stdout, _, success) = run_recaller(home.path(), &["fs", "search", "gone"]);
    assert!(success);
    assert!(!stdout.contains("gone.txt"));
}

#[test]
fn settings_show_the_effective_configuration() {
    let home = TempDir::new().unwrap();
    let (stdout, _, success) = run_recaller(home.path(), &["settings"]);
    assert!(success);
    assert!(stdout.contains("history.enable_fuzzing:        true"));
    assert!(stdout.contains("filesystem.enabled:            false"));
    assert!(stdout.contains("defaults in effect"));
}

#[test]
fn refresh_without_an_index_fails_cleanly() {
    let home = TempDir::new().unwrap();
    enable_filesystem(home.path());

    let (_, stderr, success) = run_recaller(home.path(), &["fs", "refresh"]);
    assert!(!success);
    assert!(stderr.contains("no tracked paths"));
}
