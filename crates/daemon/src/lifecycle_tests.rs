// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sbd_config::parse_config;
use yare::parameterized;

#[test]
fn pidfile_records_the_pid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scanbd.pid");

    let pidfile = Pidfile::acquire(&path).unwrap();
    assert_eq!(pidfile.path(), path);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.trim(), std::process::id().to_string());
}

#[test]
fn second_acquire_fails_while_locked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scanbd.pid");

    let _pidfile = Pidfile::acquire(&path).unwrap();
    let err = Pidfile::acquire(&path).unwrap_err();
    assert!(matches!(err, LifecycleError::PidfileLocked(_)));
}

#[test]
fn dropping_the_pidfile_removes_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scanbd.pid");

    let pidfile = Pidfile::acquire(&path).unwrap();
    drop(pidfile);
    assert!(!path.exists());

    // The lock is free again.
    let _pidfile = Pidfile::acquire(&path).unwrap();
}

#[test]
fn privilege_drop_skips_when_nothing_is_configured() {
    let config = parse_config("global {}").unwrap();
    assert!(drop_privileges(&config.global.unwrap()).is_ok());
}

#[test]
fn privilege_drop_rejects_unknown_names() {
    let config = parse_config(
        r#"
global {
  user = "sbd-no-such-user"
  group = "sbd-no-such-group"
}
"#,
    )
    .unwrap();
    let err = drop_privileges(&config.global.unwrap()).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::UnknownGroup(_) | LifecycleError::UnknownUser(_)
    ));
}

#[parameterized(
    disabled = { false, 0, "info" },
    level_one = { true, 1, "error" },
    level_two = { true, 2, "warn" },
    level_three = { true, 3, "info" },
    level_five = { true, 5, "debug" },
    level_seven = { true, 7, "trace" },
)]
fn debug_levels_map_to_directives(debug: bool, level: u8, expected: &str) {
    let run_config = RunConfig::new();
    run_config.set_debug(debug);
    run_config.set_debug_level(level);
    assert_eq!(default_directive(&run_config), expected);
}
