// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the scanner library and the hot-plug event source

pub mod hotplug;
pub mod sane;

pub use hotplug::{HotplugAction, HotplugError, HotplugEvent, HotplugMonitor, UsbMonitor};
pub use sane::{BackendError, ScanBackend, ScanDevice, StubBackend};

#[cfg(feature = "libsane")]
pub use sane::SaneBackend;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use hotplug::FakeMonitor;
#[cfg(any(test, feature = "test-support"))]
pub use sane::{BackendCall, FakeBackend};
