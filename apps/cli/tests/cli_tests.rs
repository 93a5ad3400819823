//! 命令行端到端测试

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"
[service]
model = "polled"
poll_interval_us = 200

[[actuators]]
kind = "rotary"
name = "stepper1"
max_speed = 2000.0
ramp = "none"

[[actuators]]
kind = "linear"
name = "dc1_300"
"#;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn motus() -> Command {
    Command::cargo_bin("motus-cli").unwrap()
}

#[test]
fn test_check_lists_actuators() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", CONFIG);

    motus()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("stepper1"))
        .stdout(predicate::str::contains("dc1_300"));
}

#[test]
fn test_check_rejects_duplicate_names() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "config.toml",
        "[[actuators]]\nkind = \"linear\"\nname = \"a\"\n\n[[actuators]]\nkind = \"linear\"\nname = \"a\"\n",
    );

    motus()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate actuator name"));
}

#[test]
fn test_run_script_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", CONFIG);
    let script = write(
        dir.path(),
        "script.json",
        r#"{
            "name": "short",
            "repeat": 2,
            "commands": [
                { "type": "run_ms", "actuator": "dc1_300", "duration_ms": 10, "magnitude": 255 },
                { "type": "run_steps", "actuator": "stepper1", "steps": 20, "direction": "ccw" },
                { "type": "batch", "entries": [
                    { "actuator": "stepper1", "steps": 10 },
                    { "actuator": "dc1_300", "duration_ms": 10, "magnitude": 90 }
                ] },
                { "type": "position", "actuator": "stepper1" }
            ]
        }"#,
    );

    motus()
        .arg("--config")
        .arg(&config)
        .args(["run", "--script"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("成功: 8"))
        .stdout(predicate::str::contains("stepper1: -20 步"));
}

#[test]
fn test_run_rejects_unknown_actuator_before_starting() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", CONFIG);
    let script = write(
        dir.path(),
        "script.json",
        r#"{ "name": "bad", "commands": [ { "type": "stop", "actuator": "stepper7" } ] }"#,
    );

    motus()
        .arg("--config")
        .arg(&config)
        .args(["run", "--script"])
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("stepper7"));
}

#[test]
fn test_config_init_writes_loadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("motus").join("config.toml");

    motus()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();

    motus()
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dc2_300"));
}
