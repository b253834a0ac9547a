// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner backend abstraction.
//!
//! The daemon talks to scanners exclusively through [`ScanBackend`] /
//! [`ScanDevice`]. A device handle is exclusively owned by its polling
//! thread; dropping the handle releases the device so a fired script may
//! open it itself, and the poller obtains a fresh handle afterwards.

use sbd_core::{DeviceInfo, OptionInfo, OptionValue};
use thiserror::Error;

#[cfg(feature = "libsane")]
mod libsane;
#[cfg(feature = "libsane")]
pub use libsane::SaneBackend;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BackendCall, FakeBackend};

/// Errors from scanner operations
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend initialization failed: {0}")]
    Init(String),
    #[error("device enumeration failed: {0}")]
    Enumerate(String),
    #[error("couldn't open device {device}: {reason}")]
    Open { device: String, reason: String },
    #[error("couldn't list options of {device}: {reason}")]
    Options { device: String, reason: String },
    #[error("couldn't read option {option}: {reason}")]
    Read { option: String, reason: String },
    #[error("no scanner backend compiled in")]
    Unsupported,
}

/// Access to the scanner library.
///
/// Implementations are cheaply cloneable handles; clones share the underlying
/// library instance.
pub trait ScanBackend: Clone + Send + Sync + 'static {
    type Device: ScanDevice;

    /// Enumerate attached scanners. `local_only` excludes network devices.
    fn devices(&self, local_only: bool) -> Result<Vec<DeviceInfo>, BackendError>;

    /// Open a device for option polling.
    fn open(&self, info: &DeviceInfo) -> Result<Self::Device, BackendError>;
}

/// An open device. Dropping the value closes the device.
pub trait ScanDevice: Send {
    /// List the device's options.
    fn options(&mut self) -> Result<Vec<OptionInfo>, BackendError>;

    /// Read the current value of an option.
    ///
    /// Reads can have side effects in some backends (a button state may
    /// reset once reported), so callers must not read the same option twice
    /// per poll iteration.
    fn read_value(&mut self, option: &OptionInfo) -> Result<OptionValue, BackendError>;
}

/// Backend used when the daemon is built without scanner support. Reports
/// no devices so the front-ends still run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubBackend;

impl StubBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ScanBackend for StubBackend {
    type Device = StubDevice;

    fn devices(&self, _local_only: bool) -> Result<Vec<DeviceInfo>, BackendError> {
        Ok(Vec::new())
    }

    fn open(&self, _info: &DeviceInfo) -> Result<Self::Device, BackendError> {
        Err(BackendError::Unsupported)
    }
}

/// Device type of [`StubBackend`]; never constructed.
#[derive(Debug)]
pub struct StubDevice;

impl ScanDevice for StubDevice {
    fn options(&mut self) -> Result<Vec<OptionInfo>, BackendError> {
        Err(BackendError::Unsupported)
    }

    fn read_value(&mut self, _option: &OptionInfo) -> Result<OptionValue, BackendError> {
        Err(BackendError::Unsupported)
    }
}
