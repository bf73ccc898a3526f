//! End-to-end tests of the `memwatch` binary with an isolated `HOME`.

use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn memwatch_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("memwatch"));
    cmd.env("HOME", home).env("RUST_LOG", "warn");
    cmd
}

/// Image mapped at 0: word 0 holds 4, word 8 holds 0x2a, so `0 4` reads 0x2a.
fn write_image(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("ram.raw");
    std::fs::write(&path, [0u8, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0x2a]).expect("write image");
    path
}

fn write_locations(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("Locations.txt");
    std::fs::write(&path, text).expect("write locations");
    path
}

#[test]
fn inspect_prints_current_values() {
    let home = TempDir::new().expect("home");
    let image = write_image(&home);
    let locations = write_locations(&home, "0 4\n");

    memwatch_cmd(home.path())
        .args(["inspect", "--base", "0", "--image"])
        .arg(&image)
        .arg("--locations")
        .arg(&locations)
        .assert()
        .success()
        .stdout(contains("0 4"))
        .stdout(contains("0x2a"));
}

#[test]
fn inspect_json_lists_entries() {
    let home = TempDir::new().expect("home");
    let image = write_image(&home);
    let locations = write_locations(&home, "0 4\n4\n");

    let output = memwatch_cmd(home.path())
        .args(["inspect", "--json", "--base", "0", "--image"])
        .arg(&image)
        .arg("--locations")
        .arg(&locations)
        .output()
        .expect("run inspect");
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(rows.as_array().map(Vec::len), Some(2));
    assert_eq!(rows[0]["label"], "0 4");
    assert_eq!(rows[0]["value"], "0x2a");
    assert_eq!(rows[1]["label"], "4");
    assert_eq!(rows[1]["value"], "0x0");
}

#[test]
fn inspect_without_memory_source_fails() {
    let home = TempDir::new().expect("home");
    let locations = write_locations(&home, "0 4\n");

    memwatch_cmd(home.path())
        .arg("inspect")
        .arg("--locations")
        .arg(&locations)
        .assert()
        .failure()
        .stderr(contains("no memory source"));
}

#[test]
fn inspect_rejects_socket_options() {
    let home = TempDir::new().expect("home");
    let image = write_image(&home);
    let locations = write_locations(&home, "0 4\n");

    memwatch_cmd(home.path())
        .args(["inspect", "--base", "0", "--socket", "/tmp/unused", "--image"])
        .arg(&image)
        .arg("--locations")
        .arg(&locations)
        .assert()
        .failure()
        .stderr(contains("--socket"));
}

#[test]
fn run_with_missing_locations_reports_disabled() {
    let home = TempDir::new().expect("home");
    let image = write_image(&home);

    memwatch_cmd(home.path())
        .args(["run", "--steps", "3", "--image"])
        .arg(&image)
        .assert()
        .success()
        .stdout(contains("disabled"));
}

#[test]
fn run_sends_changes_to_datagram_consumer() {
    let home = TempDir::new().expect("home");
    let image = write_image(&home);
    let locations = write_locations(&home, "0 4\n");
    let socket = home.path().join("MemoryWatcher");
    let consumer = UnixDatagram::bind(&socket).expect("bind consumer");
    consumer
        .set_read_timeout(Some(Duration::from_secs(10)))
        .expect("timeout");

    memwatch_cmd(home.path())
        .args([
            "run",
            "--base",
            "0",
            "--steps",
            "2",
            "--interval-ms",
            "1",
            "--binding",
            "datagram",
            "--image",
        ])
        .arg(&image)
        .arg("--locations")
        .arg(&locations)
        .arg("--socket")
        .arg(&socket)
        .assert()
        .success()
        .stdout(contains("ran 2 steps"));

    let mut buf = [0u8; 64];
    let n = consumer.recv(&mut buf).expect("first message");
    assert_eq!(&buf[..n], b"0 4\n2a\n\0");
    let n = consumer.recv(&mut buf).expect("second message");
    assert_eq!(&buf[..n], b"\0");
}

#[test]
fn settings_file_supplies_paths() {
    let home = TempDir::new().expect("home");
    let image = write_image(&home);
    let locations = write_locations(&home, "0 4\n");
    let root = home.path().join(".memwatch");
    std::fs::create_dir_all(&root).expect("mkdir");
    std::fs::write(
        root.join("config.yaml"),
        format!(
            "locations: {}\nmemory:\n  base: 0\n",
            locations.display()
        ),
    )
    .expect("write settings");

    memwatch_cmd(home.path())
        .args(["inspect", "--image"])
        .arg(&image)
        .assert()
        .success()
        .stdout(contains("0x2a"));
}
