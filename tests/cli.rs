//! Integration test: the binary replays a scenario file end to end.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

const SCENARIO: &str = r#"
[[panes]]
name = "main"
width = 600
height = 300

[[views]]
name = "notes"
pane = "main"
lines = 300

[[steps]]
kind = "scroll"
view = "notes"
offset = 1500

[[steps]]
kind = "font_size"
size = 14

[[steps]]
kind = "advance"
ms = 200
"#;

/// Write a scenario plus a config that keeps the log inside `temp`.
fn fixture(temp: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let scenario = temp.path().join("scenario.toml");
    fs::write(&scenario, SCENARIO).expect("write scenario");

    let config = temp.path().join("config.toml");
    let log = temp.path().join("logs").join("keeper.log");
    fs::write(
        &config,
        format!("log_file_path = {:?}\n", log.display().to_string()),
    )
    .expect("write config");
    (scenario, config)
}

#[test]
fn binary_prints_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_scroll-keeper"))
        .arg("--version")
        .output()
        .expect("Failed to execute binary");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "Expected version in output, got: {stdout}"
    );
}

#[test]
fn binary_replays_scenario_as_json() {
    let temp = TempDir::new().expect("tempdir");
    let (scenario, config) = fixture(&temp);

    let output = Command::new(env!("CARGO_BIN_EXE_scroll-keeper"))
        .arg(&scenario)
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .output()
        .expect("Failed to execute binary");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let steps = report["steps"].as_array().expect("steps array");
    assert_eq!(steps.len(), 4, "Setup plus three steps");
    assert_eq!(steps[3]["views"][0]["view"], "notes");
    assert!(temp.path().join("logs").join("keeper.log").exists());
}

#[test]
fn binary_rejects_missing_scenario() {
    let temp = TempDir::new().expect("tempdir");
    let (_, config) = fixture(&temp);

    let output = Command::new(env!("CARGO_BIN_EXE_scroll-keeper"))
        .arg(temp.path().join("absent.toml"))
        .arg("--config")
        .arg(&config)
        .output()
        .expect("Failed to execute binary");

    assert!(!output.status.success());
}
