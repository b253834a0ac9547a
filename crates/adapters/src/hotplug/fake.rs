// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake hot-plug monitor for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use super::{HotplugError, HotplugEvent, HotplugMonitor};

/// Channel-fed hot-plug monitor. The sender half lives with the test.
pub struct FakeMonitor {
    rx: Receiver<HotplugEvent>,
}

impl FakeMonitor {
    /// Create a monitor plus the sender tests push events through.
    pub fn new() -> (Self, Sender<HotplugEvent>) {
        let (tx, rx) = std::sync::mpsc::channel();
        (Self { rx }, tx)
    }
}

impl HotplugMonitor for FakeMonitor {
    fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<HotplugEvent>, HotplugError> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(HotplugError::Closed),
        }
    }
}
