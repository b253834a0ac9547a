// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake scanner backend for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use std::sync::Arc;

use parking_lot::Mutex;
use sbd_core::{DeviceInfo, OptionInfo, OptionValue};

use super::{BackendError, ScanBackend, ScanDevice};

/// Recorded call to [`FakeBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Devices { local_only: bool },
    Open { device: String },
    Close { device: String },
    Read { device: String, option: String },
}

/// Fake scanner backend.
///
/// Tests register devices and options up front, mutate option values while
/// pollers run, and inspect the recorded calls afterwards.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    devices: Vec<FakeDeviceState>,
    calls: Vec<BackendCall>,
}

struct FakeDeviceState {
    info: DeviceInfo,
    options: Vec<FakeOption>,
    open: bool,
    open_count: usize,
    fail_open: bool,
}

struct FakeOption {
    info: OptionInfo,
    value: OptionValue,
    fail_read: bool,
    reset_after_read: Option<OptionValue>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device.
    pub fn add_device(&self, name: &str) {
        let mut state = self.inner.lock();
        state.devices.push(FakeDeviceState {
            info: DeviceInfo::new(name),
            options: Vec::new(),
            open: false,
            open_count: 0,
            fail_open: false,
        });
    }

    /// Remove a device, as if it was unplugged.
    pub fn remove_device(&self, name: &str) {
        let mut state = self.inner.lock();
        state.devices.retain(|d| d.info.name != name);
    }

    /// Register an option on a device with its initial value.
    pub fn add_option(&self, device: &str, option: &str, value: OptionValue) {
        let mut state = self.inner.lock();
        if let Some(dev) = state.devices.iter_mut().find(|d| d.info.name == device) {
            let index = dev.options.len() as u32;
            dev.options.push(FakeOption {
                info: OptionInfo::new(index, option),
                value,
                fail_read: false,
                reset_after_read: None,
            });
        }
    }

    /// Set the current value of an option.
    pub fn set_value(&self, device: &str, option: &str, value: OptionValue) {
        let mut state = self.inner.lock();
        if let Some(opt) = state.option_mut(device, option) {
            opt.value = value;
        }
    }

    /// Current value of an option.
    pub fn value(&self, device: &str, option: &str) -> Option<OptionValue> {
        let mut state = self.inner.lock();
        state.option_mut(device, option).map(|o| o.value.clone())
    }

    /// Make every read of an option reset its value afterwards, like
    /// backends that clear a button state once it was reported.
    pub fn set_reset_after_read(&self, device: &str, option: &str, reset: OptionValue) {
        let mut state = self.inner.lock();
        if let Some(opt) = state.option_mut(device, option) {
            opt.reset_after_read = Some(reset);
        }
    }

    /// Make subsequent opens of a device fail.
    pub fn set_fail_open(&self, device: &str, fail: bool) {
        let mut state = self.inner.lock();
        if let Some(dev) = state.devices.iter_mut().find(|d| d.info.name == device) {
            dev.fail_open = fail;
        }
    }

    /// Make subsequent reads of an option fail.
    pub fn set_fail_read(&self, device: &str, option: &str, fail: bool) {
        let mut state = self.inner.lock();
        if let Some(opt) = state.option_mut(device, option) {
            opt.fail_read = fail;
        }
    }

    /// How often a device has been opened.
    pub fn open_count(&self, device: &str) -> usize {
        let state = self.inner.lock();
        state
            .devices
            .iter()
            .find(|d| d.info.name == device)
            .map_or(0, |d| d.open_count)
    }

    /// Whether a device is currently open.
    pub fn is_open(&self, device: &str) -> bool {
        let state = self.inner.lock();
        state
            .devices
            .iter()
            .find(|d| d.info.name == device)
            .is_some_and(|d| d.open)
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().calls.clone()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }
}

impl FakeState {
    fn option_mut(&mut self, device: &str, option: &str) -> Option<&mut FakeOption> {
        self.devices
            .iter_mut()
            .find(|d| d.info.name == device)?
            .options
            .iter_mut()
            .find(|o| o.info.name == option)
    }
}

impl ScanBackend for FakeBackend {
    type Device = FakeDevice;

    fn devices(&self, local_only: bool) -> Result<Vec<DeviceInfo>, BackendError> {
        let mut state = self.inner.lock();
        state.calls.push(BackendCall::Devices { local_only });
        Ok(state.devices.iter().map(|d| d.info.clone()).collect())
    }

    fn open(&self, info: &DeviceInfo) -> Result<Self::Device, BackendError> {
        let mut state = self.inner.lock();
        state.calls.push(BackendCall::Open {
            device: info.name.clone(),
        });
        let Some(dev) = state.devices.iter_mut().find(|d| d.info.name == info.name) else {
            return Err(BackendError::Open {
                device: info.name.clone(),
                reason: "no such device".to_string(),
            });
        };
        if dev.fail_open {
            return Err(BackendError::Open {
                device: info.name.clone(),
                reason: "injected open failure".to_string(),
            });
        }
        dev.open = true;
        dev.open_count += 1;
        Ok(FakeDevice {
            name: info.name.clone(),
            inner: Arc::clone(&self.inner),
        })
    }
}

/// An open fake device. Dropping it records the close.
pub struct FakeDevice {
    name: String,
    inner: Arc<Mutex<FakeState>>,
}

impl ScanDevice for FakeDevice {
    fn options(&mut self) -> Result<Vec<OptionInfo>, BackendError> {
        let state = self.inner.lock();
        let Some(dev) = state.devices.iter().find(|d| d.info.name == self.name) else {
            return Err(BackendError::Options {
                device: self.name.clone(),
                reason: "device gone".to_string(),
            });
        };
        Ok(dev.options.iter().map(|o| o.info.clone()).collect())
    }

    fn read_value(&mut self, option: &OptionInfo) -> Result<OptionValue, BackendError> {
        let mut state = self.inner.lock();
        state.calls.push(BackendCall::Read {
            device: self.name.clone(),
            option: option.name.clone(),
        });
        let Some(opt) = state.option_mut(&self.name, &option.name) else {
            return Err(BackendError::Read {
                option: option.name.clone(),
                reason: "no such option".to_string(),
            });
        };
        if opt.fail_read {
            return Err(BackendError::Read {
                option: option.name.clone(),
                reason: "injected read failure".to_string(),
            });
        }
        let value = opt.value.clone();
        if let Some(reset) = opt.reset_after_read.clone() {
            opt.value = reset;
        }
        Ok(value)
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        state.calls.push(BackendCall::Close {
            device: self.name.clone(),
        });
        if let Some(dev) = state.devices.iter_mut().find(|d| d.info.name == self.name) {
            dev.open = false;
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
