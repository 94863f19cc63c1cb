//! End-to-end tests of the `taskboard` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn taskboard(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("taskboard").unwrap();
    cmd.current_dir(dir)
        .env_remove("TASKBOARD_GAP")
        .env_remove("TASKBOARD_DATA_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn init_board() -> TempDir {
    let temp = TempDir::new().unwrap();
    taskboard(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized board"));
    temp
}

fn add(dir: &Path, title: &str) -> String {
    let output = taskboard(dir).args(["add", title]).output().unwrap();
    assert!(output.status.success(), "add failed: {output:?}");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn board_json(dir: &Path) -> Vec<serde_json::Value> {
    let output = taskboard(dir)
        .args(["--format", "json", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_commands_require_a_board() {
    let temp = TempDir::new().unwrap();
    taskboard(temp.path())
        .arg("list")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("taskboard init"));
}

#[test]
fn test_init_is_idempotent() {
    let temp = init_board();
    taskboard(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert!(temp.path().join(".taskboard/tasks").is_dir());
}

#[test]
fn test_add_and_list() {
    let temp = init_board();
    let id = add(temp.path(), "Write release notes");
    assert_eq!(id.len(), 26);

    taskboard(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Write release notes"))
        .stdout(predicate::str::contains("todo"));
}

#[test]
fn test_move_to_done_records_completion() {
    let temp = init_board();
    let id = add(temp.path(), "Ship it");

    taskboard(temp.path())
        .args(["move", &id[..10], "done"])
        .assert()
        .success();

    let rows = board_json(temp.path());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["lane"], "done");
    assert_eq!(rows[0]["status"], "done");
    assert!(rows[0]["done_at"].is_string());
}

#[test]
fn test_move_to_done_ignores_index() {
    let temp = init_board();
    let id = add(temp.path(), "Ship it");

    taskboard(temp.path())
        .args(["move", &id, "done", "--index", "9"])
        .assert()
        .success();

    let rows = board_json(temp.path());
    assert_eq!(rows[0]["lane"], "done");
}

#[test]
fn test_move_with_index_orders_lane() {
    let temp = init_board();
    let first = add(temp.path(), "First");
    let second = add(temp.path(), "Second");
    let third = add(temp.path(), "Third");

    taskboard(temp.path())
        .args(["move", &third, "todo", "--index", "0"])
        .assert()
        .success();

    let ids: Vec<String> = board_json(temp.path())
        .iter()
        .map(|row| row["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids[0], third);
    assert!(ids.contains(&first) && ids.contains(&second));
}

#[test]
fn test_edit_archive_and_delete() {
    let temp = init_board();
    let keep = add(temp.path(), "Keep");
    let hide = add(temp.path(), "Hide");
    let gone = add(temp.path(), "Drop");

    taskboard(temp.path())
        .args(["edit", &keep, "--title", "Kept"])
        .assert()
        .success();
    taskboard(temp.path()).args(["archive", &hide]).assert().success();
    taskboard(temp.path()).args(["delete", &gone]).assert().success();

    let rows = board_json(temp.path());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Kept");
    assert!(temp
        .path()
        .join(".taskboard/tasks")
        .join(format!("{hide}.json"))
        .exists());
    assert!(!temp
        .path()
        .join(".taskboard/tasks")
        .join(format!("{gone}.json"))
        .exists());
}

#[test]
fn test_edit_without_changes_fails() {
    let temp = init_board();
    let id = add(temp.path(), "Untouched");
    taskboard(temp.path())
        .args(["edit", &id])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nothing to change"));
}

#[test]
fn test_resort_by_title() {
    let temp = init_board();
    for title in ["cherry", "apple", "banana"] {
        add(temp.path(), title);
    }

    taskboard(temp.path())
        .args(["resort", "todo", "--by", "title"])
        .assert()
        .success();

    let titles: Vec<String> = board_json(temp.path())
        .iter()
        .map(|row| row["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["apple", "banana", "cherry"]);
}

#[test]
fn test_unknown_task_is_reported() {
    let temp = init_board();
    taskboard(temp.path())
        .args(["delete", "nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no task matches"));
}

#[test]
fn test_config_file_sets_data_dir() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join(".taskboard")).unwrap();
    std::fs::write(
        temp.path().join(".taskboard/config.toml"),
        "data_dir = \"board-data\"\n",
    )
    .unwrap();

    taskboard(temp.path()).arg("init").assert().success();
    assert!(temp.path().join("board-data/tasks").is_dir());
}
