// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use signal_hook::consts::signal::{SIGHUP, SIGUSR1, SIGUSR2};
use signal_hook::low_level::raise;

#[test]
#[serial]
fn usr1_requests_a_fleet_stop() {
    let mut listener = SignalListener::install().unwrap();
    raise(SIGUSR1).unwrap();
    assert_eq!(listener.wait(), SignalEvent::StopFleet);
}

#[test]
#[serial]
fn usr2_requests_a_fleet_start() {
    let mut listener = SignalListener::install().unwrap();
    raise(SIGUSR2).unwrap();
    assert_eq!(listener.wait(), SignalEvent::StartFleet);
}

#[test]
#[serial]
fn hup_requests_a_reload() {
    let mut listener = SignalListener::install().unwrap();
    raise(SIGHUP).unwrap();
    assert_eq!(listener.wait(), SignalEvent::Reload);
}

#[test]
#[serial]
fn masked_threads_still_run() {
    // Masking must not fail on a worker thread.
    std::thread::spawn(mask_thread_signals).join().unwrap();
}
