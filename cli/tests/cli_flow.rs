use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_plate"))
}

fn plate(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(bin())
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run plate")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn users_json_with_no_saved_plates_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = plate(dir.path(), &["users", "--json"]);

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_json(&output), serde_json::json!([]));
}

#[test]
fn users_text_with_no_saved_plates_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = plate(dir.path(), &["users"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No saved plates"));
}

#[test]
fn save_then_load_keeps_names_with_commas() {
    let dir = tempfile::tempdir().unwrap();
    let food = "Apples, fuji, with skin, raw";

    let saved = plate(dir.path(), &["save", "sam", "-p", "pw", food, "rice"]);
    assert!(saved.status.success());

    let loaded = plate(dir.path(), &["load", "sam", "-p", "pw", "--json"]);
    assert!(loaded.status.success());
    let expected = serde_json::json!({ "username": "sam", "plate": [food, "rice"] });
    assert_eq!(stdout_json(&loaded), expected);

    let users = plate(dir.path(), &["users", "--json"]);
    assert!(users.status.success());
    assert_eq!(stdout_json(&users), serde_json::json!(["sam"]));
}

#[test]
fn load_with_wrong_password_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let saved = plate(dir.path(), &["save", "sam", "-p", "pw", "apple"]);
    assert!(saved.status.success());

    let loaded = plate(dir.path(), &["load", "sam", "-p", "nope", "--json"]);
    assert_eq!(loaded.status.code(), Some(2));
    assert_eq!(stdout_json(&loaded)["reason"], "wrong_password");
}
