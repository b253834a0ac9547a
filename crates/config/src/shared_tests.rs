// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn write_config(dir: &std::path::Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("scanbd.conf");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn load_exposes_a_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "global { timeout = 123 }");

    let shared = SharedConfig::load(&path).unwrap();
    let config = shared.current();
    assert_eq!(config.global.as_ref().unwrap().timeout(), 123);
    assert_eq!(shared.path(), path);
}

#[test]
fn load_fails_on_missing_file() {
    assert!(SharedConfig::load("/nonexistent/scanbd.conf").is_err());
}

#[test]
fn reload_picks_up_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "global { timeout = 100 }");

    let shared = SharedConfig::load(&path).unwrap();
    write_config(dir.path(), "global { timeout = 200 }");
    shared.reload().unwrap();

    assert_eq!(shared.current().global.as_ref().unwrap().timeout(), 200);
}

#[test]
fn failed_reload_keeps_previous_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "global { timeout = 100 }");

    let shared = SharedConfig::load(&path).unwrap();
    write_config(dir.path(), "global { timeout = ");

    assert!(shared.reload().is_err());
    assert_eq!(shared.current().global.as_ref().unwrap().timeout(), 100);
}

#[test]
fn snapshots_outlive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "global { timeout = 100 }");

    let shared = SharedConfig::load(&path).unwrap();
    let before = shared.current();
    write_config(dir.path(), "global { timeout = 200 }");
    shared.reload().unwrap();

    assert_eq!(before.global.as_ref().unwrap().timeout(), 100);
    assert_eq!(shared.current().global.as_ref().unwrap().timeout(), 200);
}
