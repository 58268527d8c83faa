use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn mirror_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mirror"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

fn workspace() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().expect("workspace");
    let source = tmp.path().join("source");
    let dest = tmp.path().join("dest");
    fs::create_dir_all(&source).expect("mkdir source");
    fs::create_dir_all(&dest).expect("mkdir dest");
    (tmp, source, dest)
}

#[test]
fn dry_run_sync_reports_operations_and_writes_nothing() {
    let home = TempDir::new().expect("home");
    let (_ws, source, dest) = workspace();
    write(&source, "a.txt", "alpha");

    mirror_cmd(home.path())
        .arg("sync")
        .arg(&source)
        .arg(&dest)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(contains("[dry-run]"))
        .stdout(contains("1 copied"))
        .stdout(contains("a.txt"));

    let mut entries = fs::read_dir(&dest).expect("read dest");
    assert!(entries.next().is_none(), "dry-run must not create files");
}

#[test]
fn sync_then_resync_is_already_in_sync() {
    let home = TempDir::new().expect("home");
    let (_ws, source, dest) = workspace();
    write(&source, "a.txt", "alpha");
    write(&source, "nested/b.txt", "beta");
    write(&dest, "stale.txt", "stale");

    mirror_cmd(home.path())
        .arg("sync")
        .arg(&source)
        .arg(&dest)
        .assert()
        .success()
        .stdout(contains("2 copied, 0 moved, 1 deleted"));

    assert_eq!(fs::read_to_string(dest.join("nested/b.txt")).expect("read"), "beta");
    assert!(!dest.join("stale.txt").exists());

    mirror_cmd(home.path())
        .arg("sync")
        .arg(&source)
        .arg(&dest)
        .assert()
        .success()
        .stdout(contains("already in sync"));
}

#[test]
fn json_output_lists_tagged_operations() {
    let home = TempDir::new().expect("home");
    let (_ws, source, dest) = workspace();
    write(&source, "renamed.txt", "same");
    write(&dest, "original.txt", "same");

    let output = mirror_cmd(home.path())
        .arg("plan")
        .arg(&source)
        .arg(&dest)
        .arg("--json")
        .output()
        .expect("run mirror plan --json");
    assert!(
        output.status.success(),
        "command failed: status={} stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr),
    );

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["dry_run"], true);
    assert_eq!(value["source_files"], 1);
    let ops = value["operations"].as_array().expect("operations array");
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0]["op"], "move");
    assert!(dest.join("original.txt").exists(), "plan must not move files");
}

#[test]
fn swapped_names_fail_with_destination_collision() {
    let home = TempDir::new().expect("home");
    let (_ws, source, dest) = workspace();
    write(&source, "a.txt", "one");
    write(&source, "b.txt", "two");
    write(&dest, "a.txt", "two");
    write(&dest, "b.txt", "one");

    mirror_cmd(home.path())
        .arg("sync")
        .arg(&source)
        .arg(&dest)
        .assert()
        .failure()
        .stderr(contains("destination collision"));

    assert_eq!(fs::read_to_string(dest.join("a.txt")).expect("read"), "two");
}

#[test]
fn sync_without_paths_or_profile_fails() {
    let home = TempDir::new().expect("home");
    mirror_cmd(home.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(contains("--profile"));
}

#[test]
fn profile_add_list_sync_remove() {
    let home = TempDir::new().expect("home");
    let (_ws, source, dest) = workspace();
    write(&source, "keep/a.txt", "alpha");
    write(&source, "cache/blob", "skip me");

    mirror_cmd(home.path())
        .args(["profile", "add", "docs"])
        .arg(&source)
        .arg(&dest)
        .args(["--exclude", "cache"])
        .assert()
        .success()
        .stdout(contains("Added profile 'docs'"));

    mirror_cmd(home.path())
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(contains("docs"))
        .stdout(contains("cache"));

    mirror_cmd(home.path())
        .args(["sync", "--profile", "docs"])
        .assert()
        .success()
        .stdout(contains("'docs' synced"));
    assert!(dest.join("keep/a.txt").exists());
    assert!(!dest.join("cache/blob").exists());

    mirror_cmd(home.path())
        .args(["sync", "--all"])
        .assert()
        .success()
        .stdout(contains("'docs' — already in sync"));

    mirror_cmd(home.path())
        .args(["profile", "remove", "docs"])
        .assert()
        .success();

    mirror_cmd(home.path())
        .args(["sync", "--profile", "docs"])
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn profile_add_twice_fails() {
    let home = TempDir::new().expect("home");
    let (_ws, source, dest) = workspace();

    for expect_success in [true, false] {
        let assert = mirror_cmd(home.path())
            .args(["profile", "add", "docs"])
            .arg(&source)
            .arg(&dest)
            .assert();
        if expect_success {
            assert.success();
        } else {
            assert.failure().stderr(contains("already exists"));
        }
    }
}
