// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sbd_adapters::{BackendCall, FakeBackend};
use sbd_core::OptionValue;
use std::time::{Duration, Instant};

fn config(dir: &std::path::Path, content: &str) -> SharedConfig {
    let path = dir.join("scanbd.conf");
    std::fs::write(&path, content).unwrap();
    SharedConfig::load(&path).unwrap()
}

fn wait_for(predicate: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

fn two_device_backend() -> FakeBackend {
    let backend = FakeBackend::new();
    backend.add_device("scanner0");
    backend.add_option("scanner0", "button", OptionValue::Int(0));
    backend.add_device("scanner1");
    backend.add_option("scanner1", "button", OptionValue::Int(0));
    backend
}

#[test]
fn start_creates_one_worker_per_device() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = Supervisor::new(two_device_backend(), config(dir.path(), "global { timeout = 10 }"));

    supervisor.start();
    assert_eq!(supervisor.device_names(), ["scanner0", "scanner1"]);
    assert!(supervisor.is_running());

    supervisor.stop();
    assert!(supervisor.device_names().is_empty());
    assert!(!supervisor.is_running());
}

#[test]
fn start_is_idempotent_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let backend = two_device_backend();
    let supervisor = Supervisor::new(backend.clone(), config(dir.path(), "global { timeout = 10 }"));

    supervisor.start();
    supervisor.start();

    // The second start returned before enumerating again.
    let enumerations = backend
        .calls()
        .iter()
        .filter(|call| matches!(call, BackendCall::Devices { .. }))
        .count();
    assert_eq!(enumerations, 1);
    assert_eq!(supervisor.device_names().len(), 2);

    supervisor.stop();
    // Stop on an empty fleet is a no-op.
    supervisor.stop();
}

#[test]
fn restart_reenumerates_devices() {
    let dir = tempfile::tempdir().unwrap();
    let backend = two_device_backend();
    let supervisor = Supervisor::new(backend.clone(), config(dir.path(), "global { timeout = 10 }"));

    supervisor.start();
    assert_eq!(supervisor.device_names().len(), 2);

    supervisor.stop();
    backend.remove_device("scanner0");
    supervisor.start();

    assert_eq!(supervisor.device_names(), ["scanner1"]);
    supervisor.stop();
}

#[test]
fn duplicate_enumeration_entries_get_one_worker() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    backend.add_device("scanner0");
    backend.add_device("scanner0");

    let supervisor = Supervisor::new(backend, config(dir.path(), "global { timeout = 10 }"));
    supervisor.start();
    assert_eq!(supervisor.device_names(), ["scanner0"]);
    supervisor.stop();
}

#[test]
fn local_only_follows_the_config() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    let supervisor = Supervisor::new(
        backend.clone(),
        config(dir.path(), "global { local_only = false }"),
    );

    supervisor.start();
    assert_eq!(
        backend.calls().first(),
        Some(&BackendCall::Devices { local_only: false })
    );
    supervisor.stop();
}

#[test]
fn enumeration_defaults_to_local_devices() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    let supervisor = Supervisor::new(backend.clone(), config(dir.path(), "global { timeout = 10 }"));

    supervisor.start();
    assert_eq!(
        backend.calls().first(),
        Some(&BackendCall::Devices { local_only: true })
    );
    supervisor.stop();
}

#[test]
fn trigger_for_unknown_device_or_action_is_harmless() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = Supervisor::new(two_device_backend(), config(dir.path(), "global { timeout = 10 }"));

    supervisor.start();
    supervisor.trigger_action("no-such-device", "scan");
    supervisor.trigger_action("scanner0", "no-such-action");
    supervisor.stop();
}

#[test]
fn workers_stop_when_the_supervisor_drops() {
    let dir = tempfile::tempdir().unwrap();
    let backend = two_device_backend();
    {
        let supervisor = Supervisor::new(backend.clone(), config(dir.path(), "global { timeout = 10 }"));
        supervisor.start();
        assert!(wait_for(
            || backend.is_open("scanner0"),
            Duration::from_secs(5)
        ));
    }

    // Drop joined the workers, which released their devices.
    assert!(!backend.is_open("scanner0"));
    assert!(!backend.is_open("scanner1"));
}
