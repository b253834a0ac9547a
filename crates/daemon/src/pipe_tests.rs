// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::supervisor::Supervisor;
use sbd_adapters::{BackendCall, FakeBackend};
use sbd_config::SharedConfig;
use sbd_core::OptionValue;
use std::time::Instant;
use yare::parameterized;

fn wait_for(predicate: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[parameterized(
    plain = { b"scanner0,scan".as_slice(), Some(("scanner0", "scan")) },
    nul_terminated = { b"scanner0,scan\0garbage".as_slice(), Some(("scanner0", "scan")) },
    missing_comma = { b"scanner0scan".as_slice(), None },
    three_fields = { b"scanner0,scan,extra".as_slice(), None },
    empty_device = { b",scan".as_slice(), None },
    empty_action = { b"scanner0,".as_slice(), None },
    empty_payload = { b"\0".as_slice(), None },
)]
fn message_parsing(bytes: &[u8], expected: Option<(&str, &str)>) {
    let parsed = parse_message(bytes);
    assert_eq!(
        parsed,
        expected.map(|(device, action)| (device.to_string(), action.to_string()))
    );
}

#[test]
fn rejects_non_utf8_payloads() {
    assert_eq!(parse_message(&[0xff, 0xfe, b',', b'a']), None);
}

#[test]
fn writer_rejects_oversized_messages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scanbd.pipe");

    let message = "x".repeat(MAX_MESSAGE_SIZE);
    let err = write_message(&path, &message).unwrap_err();
    assert!(matches!(err, PipeError::TooLong { .. }));
}

#[test]
fn writer_fails_without_a_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scanbd.pipe");
    nix::unistd::mkfifo(&path, Mode::S_IRUSR | Mode::S_IWUSR).unwrap();

    // Opening the write side non-blocking without a reader fails (ENXIO).
    assert!(matches!(
        write_message(&path, "scanner0,scan"),
        Err(PipeError::Open { .. })
    ));
}

#[test]
fn pipe_path_comes_from_the_config() {
    let config = sbd_config::parse_config(r#"global { pipefile = "/run/sbd/cmd.pipe" }"#).unwrap();
    assert_eq!(pipe_path(&config), PathBuf::from("/run/sbd/cmd.pipe"));

    let bare = sbd_config::parse_config("").unwrap();
    assert_eq!(pipe_path(&bare), PathBuf::from("scanbd.pipe"));
}

/// Full front-end path: a message written to the FIFO triggers the action
/// on the right worker.
#[test]
fn messages_reach_the_supervisor() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let script = dir.path().join("scan.sh");
    std::fs::write(
        &script,
        format!("#!/bin/sh\necho \"$SCANBD_ACTION\" >> {}\n", out.display()),
    )
    .unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();

    let config_path = dir.path().join("scanbd.conf");
    std::fs::write(
        &config_path,
        format!(
            r#"
global {{
  timeout = 10
  scriptdir = "{}"

  action "scan" {{
    filter = "^button$"
    script = "scan.sh"
  }}
}}
"#,
            dir.path().display()
        ),
    )
    .unwrap();
    let config = SharedConfig::load(&config_path).unwrap();

    let backend = FakeBackend::new();
    backend.add_device("scanner0");
    backend.add_option("scanner0", "button", OptionValue::Int(0));

    let supervisor = Arc::new(Supervisor::new(backend.clone(), config));
    supervisor.start();

    // Wait until the worker polls (a second read of the option means its
    // actions are resolved and triggerable).
    assert!(wait_for(
        || {
            backend
                .calls()
                .iter()
                .filter(|call| matches!(call, BackendCall::Read { .. }))
                .count()
                >= 2
        },
        Duration::from_secs(5)
    ));

    let pipe_file = dir.path().join("scanbd.pipe");
    let handler = PipeHandler::start(pipe_file.clone(), Arc::clone(&supervisor)).unwrap();

    // The reader creates the FIFO and opens it; retry the write until the
    // read side is connected.
    assert!(wait_for(
        || write_message(&pipe_file, "scanner0,scan").is_ok(),
        Duration::from_secs(5)
    ));

    assert!(wait_for(|| out.exists(), Duration::from_secs(5)));

    handler.stop();
    supervisor.stop();
    assert!(!pipe_file.exists(), "stop must unlink the FIFO");
}

#[test]
fn invalid_messages_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("scanbd.conf");
    std::fs::write(&config_path, "global {}").unwrap();
    let config = SharedConfig::load(&config_path).unwrap();

    let backend = FakeBackend::new();
    let supervisor = Arc::new(Supervisor::new(backend, config));

    let pipe_file = dir.path().join("scanbd.pipe");
    let handler = PipeHandler::start(pipe_file.clone(), Arc::clone(&supervisor)).unwrap();

    assert!(wait_for(
        || write_message(&pipe_file, "no comma here").is_ok(),
        Duration::from_secs(5)
    ));

    // A maximum-size message is still delivered in one piece.
    let device = "x".repeat(MAX_MESSAGE_SIZE - "x,scan".len());
    let message = format!("{},scan", device);
    assert_eq!(message.len(), MAX_MESSAGE_SIZE - 1);
    assert!(write_message(&pipe_file, &message).is_ok());

    thread::sleep(Duration::from_millis(150));
    handler.stop();
}
