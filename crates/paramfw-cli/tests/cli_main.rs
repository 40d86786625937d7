//! Basic CLI tests for the paramfw command-line interface.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn paramfw() -> Command {
    let mut cmd = Command::cargo_bin("paramfw").unwrap();
    // Keep configuration coming from the test files only.
    cmd.env_remove("PARAMFW_VIRTUAL_FALLBACK")
        .env_remove("PARAMFW_PLUGINS")
        .env_remove("PARAMFW_PLUGIN_PATH");
    cmd
}

/// Write a config declaring one missing plugin and one subsystem of its type.
fn missing_plugin_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("paramfw.toml");
    fs::write(
        &path,
        r#"
        [[plugin_locations]]
        folder = "/nonexistent/paramfw"
        plugins = ["libAudio-subsystem.so"]

        [[subsystems]]
        name = "audio"
        type = "AUDIO"
        "#,
    )
    .unwrap();
    path
}

#[test]
fn test_cli_help() {
    let mut cmd = paramfw();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("symbol"))
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("resync"));
}

#[test]
fn test_no_subcommand_shows_error() {
    let mut cmd = paramfw();

    // Clap's error code for missing required subcommand
    cmd.assert().failure().code(2);
}

#[test]
fn test_symbol_derivation() {
    let mut cmd = paramfw();
    cmd.arg("symbol")
        .arg("/usr/lib/libAudioHw-subsystem.so")
        .arg("libFoo-subsystem_host.so");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "/usr/lib/libAudioHw-subsystem.so -> AUDIOHW -> getAUDIOHWSubsystemBuilder",
        ))
        .stdout(predicate::str::contains(
            "libFoo-subsystem_host.so -> FOO -> getFOOSubsystemBuilder",
        ));
}

#[test]
fn test_symbol_requires_plugin() {
    let mut cmd = paramfw();
    cmd.arg("symbol");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_load_missing_plugin_fails() {
    let dir = TempDir::new().unwrap();
    let config = missing_plugin_config(&dir);

    let mut cmd = paramfw();
    cmd.arg("load").arg("--config").arg(&config);

    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("FAILED"))
        .stdout(predicate::str::contains(
            "Unable to load the following plugins: /nonexistent/paramfw/libAudio-subsystem.so.",
        ));
}

#[test]
fn test_load_missing_plugin_with_fallback() {
    let dir = TempDir::new().unwrap();
    let config = missing_plugin_config(&dir);

    let mut cmd = paramfw();
    cmd.arg("load").arg("--config").arg(&config).arg("--fallback");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Subsystem:       audio (Virtual)"))
        .stdout(predicate::str::contains("OK"));
}

#[test]
fn test_load_json_output() {
    let dir = TempDir::new().unwrap();
    let config = missing_plugin_config(&dir);

    let mut cmd = paramfw();
    cmd.arg("load")
        .arg("--config")
        .arg(&config)
        .arg("--fallback")
        .arg("--json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();

    assert_eq!(summary["success"], true);
    assert_eq!(summary["plugins_fully_loaded"], false);
    assert_eq!(summary["subsystems"][0]["name"], "audio");
    assert_eq!(summary["subsystems"][0]["type"], "Virtual");
    assert!(summary["errors"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e.as_str().unwrap().contains("libAudio-subsystem.so")));
}

#[test]
fn test_load_fallback_from_env() {
    let dir = TempDir::new().unwrap();
    let config = missing_plugin_config(&dir);

    let mut cmd = paramfw();
    cmd.env("PARAMFW_VIRTUAL_FALLBACK", "true")
        .arg("load")
        .arg("--config")
        .arg(&config);

    cmd.assert().success();
}

#[test]
fn test_load_missing_config() {
    let mut cmd = paramfw();
    cmd.arg("load").arg("--config").arg("/nonexistent/paramfw.toml");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_resync_with_virtual_subsystems() {
    let dir = TempDir::new().unwrap();
    let config = missing_plugin_config(&dir);

    let mut cmd = paramfw();
    cmd.arg("resync").arg("--config").arg(&config).arg("--fallback");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Total: 0 subsystem(s) to resync"));
}
