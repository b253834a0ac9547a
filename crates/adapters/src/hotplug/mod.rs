// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hot-plug event source.
//!
//! The daemon restarts its polling fleet when a USB device appears or
//! disappears. [`UsbMonitor`] observes the kernel's USB device nodes under
//! `/dev/bus/usb`; a created node is a plugged device, a removed node an
//! unplugged one.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeMonitor;

/// Device type reported for USB device nodes.
pub const USB_DEVICE_TYPE: &str = "usb_device";

/// Directory the kernel exposes USB device nodes in.
const USB_DEV_DIR: &str = "/dev/bus/usb";

/// Errors from the hot-plug monitor
#[derive(Debug, Error)]
pub enum HotplugError {
    #[error("couldn't watch {path}: {source}")]
    Watch {
        path: PathBuf,
        source: notify::Error,
    },
    #[error("event stream failed: {0}")]
    Stream(String),
    #[error("event stream closed")]
    Closed,
}

/// What happened to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotplugAction {
    Add,
    Remove,
}

/// One observed device event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotplugEvent {
    pub action: HotplugAction,
    /// Device category, e.g. [`USB_DEVICE_TYPE`].
    pub device_type: String,
    /// The device node the event was observed on.
    pub node: PathBuf,
}

/// A stream of device add/remove events.
pub trait HotplugMonitor: Send + 'static {
    /// Wait up to `timeout` for the next event. `Ok(None)` means nothing
    /// relevant happened within the timeout.
    fn recv_timeout(&mut self, timeout: Duration)
        -> Result<Option<HotplugEvent>, HotplugError>;
}

/// Hot-plug monitor over the USB device-node tree.
pub struct UsbMonitor {
    // Held so the watch stays registered.
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
}

impl UsbMonitor {
    /// Watch the system USB device tree.
    pub fn new() -> Result<Self, HotplugError> {
        Self::watch_path(Path::new(USB_DEV_DIR))
    }

    /// Watch an arbitrary directory for device nodes.
    pub fn watch_path(path: &Path) -> Result<Self, HotplugError> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx).map_err(|source| HotplugError::Watch {
            path: path.to_path_buf(),
            source,
        })?;
        watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(|source| HotplugError::Watch {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }
}

impl HotplugMonitor for UsbMonitor {
    fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<HotplugEvent>, HotplugError> {
        match self.rx.recv_timeout(timeout) {
            Ok(Ok(event)) => Ok(classify(&event)),
            Ok(Err(e)) => Err(HotplugError::Stream(e.to_string())),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(HotplugError::Closed),
        }
    }
}

/// Translate a filesystem event on the device tree into a hot-plug event.
fn classify(event: &Event) -> Option<HotplugEvent> {
    let action = match event.kind {
        EventKind::Create(_) => HotplugAction::Add,
        EventKind::Remove(_) => HotplugAction::Remove,
        _ => return None,
    };
    let node = event.paths.first()?.clone();
    Some(HotplugEvent {
        action,
        device_type: USB_DEVICE_TYPE.to_string(),
        node,
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
