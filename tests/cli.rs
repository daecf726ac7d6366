use assert_cmd::Command;
use std::process::Stdio;

#[test]
fn help_lists_the_disciplines() {
    let output = Command::cargo_bin("mnemo")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("calendar"));
    assert!(stdout.contains("digits"));
    assert!(stdout.contains("cards"));
    assert!(stdout.contains("letters"));
}

#[test]
fn version_flag_succeeds() {
    Command::cargo_bin("mnemo")
        .unwrap()
        .arg("--version")
        .assert()
        .success();
}

#[test]
fn rejects_non_tty_stdin() {
    let output = std::process::Command::new(assert_cmd::cargo::cargo_bin("mnemo"))
        .env("HOME", std::env::temp_dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap()
        .wait_with_output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stdin must be a tty"));
}

#[test]
fn export_works_without_a_tty() {
    let home = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("mnemo")
        .unwrap()
        .env("HOME", home.path())
        .arg("--export")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "{}");
}

#[test]
fn rejects_an_unknown_discipline() {
    Command::cargo_bin("mnemo")
        .unwrap()
        .arg("chess")
        .assert()
        .failure();
}
