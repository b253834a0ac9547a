// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner backend against the system SANE library.
//!
//! Compiled only with the `libsane` feature; links `libsane.so`. One library
//! instance is shared by all backend clones and released when the last one
//! drops. Device handles move between threads but are only ever used by one
//! thread at a time (the poller owns its handle exclusively).

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::sync::Arc;

use sbd_core::{DeviceInfo, Fixed, OptionInfo, OptionValue};

use super::{BackendError, ScanBackend, ScanDevice};

mod ffi {
    use std::os::raw::{c_char, c_int, c_void};

    pub type SaneStatus = c_int;
    pub type SaneHandle = *mut c_void;

    pub const STATUS_GOOD: SaneStatus = 0;

    pub const TYPE_BOOL: c_int = 0;
    pub const TYPE_INT: c_int = 1;
    pub const TYPE_FIXED: c_int = 2;
    pub const TYPE_STRING: c_int = 3;
    pub const TYPE_BUTTON: c_int = 4;
    pub const TYPE_GROUP: c_int = 5;

    pub const ACTION_GET_VALUE: c_int = 0;

    #[repr(C)]
    pub struct SaneDevice {
        pub name: *const c_char,
        pub vendor: *const c_char,
        pub model: *const c_char,
        pub kind: *const c_char,
    }

    #[repr(C)]
    pub struct SaneOptionDescriptor {
        pub name: *const c_char,
        pub title: *const c_char,
        pub desc: *const c_char,
        pub value_type: c_int,
        pub unit: c_int,
        pub size: c_int,
        pub cap: c_int,
        pub constraint_type: c_int,
        pub constraint: *const c_void,
    }

    #[link(name = "sane")]
    extern "C" {
        pub fn sane_init(version_code: *mut c_int, authorize: *const c_void) -> SaneStatus;
        pub fn sane_exit();
        pub fn sane_get_devices(
            device_list: *mut *const *const SaneDevice,
            local_only: c_int,
        ) -> SaneStatus;
        pub fn sane_open(devicename: *const c_char, handle: *mut SaneHandle) -> SaneStatus;
        pub fn sane_close(handle: SaneHandle);
        pub fn sane_get_option_descriptor(
            handle: SaneHandle,
            option: c_int,
        ) -> *const SaneOptionDescriptor;
        pub fn sane_control_option(
            handle: SaneHandle,
            option: c_int,
            action: c_int,
            value: *mut c_void,
            info: *mut c_int,
        ) -> SaneStatus;
        pub fn sane_strstatus(status: SaneStatus) -> *const c_char;
    }
}

/// Render a SANE status code for error messages.
fn status_string(status: ffi::SaneStatus) -> String {
    let ptr = unsafe { ffi::sane_strstatus(status) };
    if ptr.is_null() {
        return format!("status {}", status);
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

fn string_at(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Owns the library initialization; `sane_exit` runs when the last backend
/// clone drops.
struct SaneLibrary;

impl Drop for SaneLibrary {
    fn drop(&mut self) {
        unsafe { ffi::sane_exit() };
    }
}

/// Scanner backend bound to the system SANE library.
#[derive(Clone)]
pub struct SaneBackend {
    library: Arc<SaneLibrary>,
}

impl SaneBackend {
    /// Initialize the library.
    pub fn init() -> Result<Self, BackendError> {
        let mut version: c_int = 0;
        let status = unsafe { ffi::sane_init(&mut version, ptr::null()) };
        if status != ffi::STATUS_GOOD {
            return Err(BackendError::Init(status_string(status)));
        }
        tracing::debug!(version, "sane library initialized");
        Ok(Self {
            library: Arc::new(SaneLibrary),
        })
    }
}

impl ScanBackend for SaneBackend {
    type Device = SaneDeviceHandle;

    fn devices(&self, local_only: bool) -> Result<Vec<DeviceInfo>, BackendError> {
        let mut list: *const *const ffi::SaneDevice = ptr::null();
        let status = unsafe { ffi::sane_get_devices(&mut list, c_int::from(local_only)) };
        if status != ffi::STATUS_GOOD {
            return Err(BackendError::Enumerate(status_string(status)));
        }

        let mut devices = Vec::new();
        if list.is_null() {
            return Ok(devices);
        }
        let mut entry = list;
        // The list is NULL-terminated; entries stay valid until the next
        // sane_get_devices call, so everything is copied out here.
        while !unsafe { *entry }.is_null() {
            let device = unsafe { &**entry };
            devices.push(DeviceInfo {
                name: string_at(device.name),
                vendor: string_at(device.vendor),
                model: string_at(device.model),
                kind: string_at(device.kind),
            });
            entry = unsafe { entry.add(1) };
        }
        Ok(devices)
    }

    fn open(&self, info: &DeviceInfo) -> Result<Self::Device, BackendError> {
        let name = CString::new(info.name.as_str()).map_err(|_| BackendError::Open {
            device: info.name.clone(),
            reason: "device name contains NUL".to_string(),
        })?;
        let mut handle: ffi::SaneHandle = ptr::null_mut();
        let status = unsafe { ffi::sane_open(name.as_ptr(), &mut handle) };
        if status != ffi::STATUS_GOOD || handle.is_null() {
            return Err(BackendError::Open {
                device: info.name.clone(),
                reason: status_string(status),
            });
        }
        Ok(SaneDeviceHandle {
            handle,
            name: info.name.clone(),
            _library: Arc::clone(&self.library),
        })
    }
}

/// An open SANE device.
pub struct SaneDeviceHandle {
    handle: ffi::SaneHandle,
    name: String,
    _library: Arc<SaneLibrary>,
}

// The raw handle moves to the polling thread and is used from exactly one
// thread at a time.
unsafe impl Send for SaneDeviceHandle {}

impl Drop for SaneDeviceHandle {
    fn drop(&mut self) {
        unsafe { ffi::sane_close(self.handle) };
    }
}

impl SaneDeviceHandle {
    fn descriptor(&self, index: c_int) -> Option<&ffi::SaneOptionDescriptor> {
        let descriptor = unsafe { ffi::sane_get_option_descriptor(self.handle, index) };
        if descriptor.is_null() {
            None
        } else {
            Some(unsafe { &*descriptor })
        }
    }

    /// Number of options, read from the well-known descriptor 0.
    fn option_count(&self) -> Result<c_int, BackendError> {
        let mut count: c_int = 0;
        let status = unsafe {
            ffi::sane_control_option(
                self.handle,
                0,
                ffi::ACTION_GET_VALUE,
                (&mut count as *mut c_int).cast::<c_void>(),
                ptr::null_mut(),
            )
        };
        if status != ffi::STATUS_GOOD {
            return Err(BackendError::Options {
                device: self.name.clone(),
                reason: status_string(status),
            });
        }
        Ok(count)
    }
}

impl ScanDevice for SaneDeviceHandle {
    fn options(&mut self) -> Result<Vec<OptionInfo>, BackendError> {
        let count = self.option_count()?;
        let mut options = Vec::new();
        for index in 1..count {
            let Some(descriptor) = self.descriptor(index) else {
                continue;
            };
            let name = string_at(descriptor.name);
            if name.is_empty() {
                continue;
            }
            options.push(OptionInfo::new(index as u32, name));
        }
        Ok(options)
    }

    fn read_value(&mut self, option: &OptionInfo) -> Result<OptionValue, BackendError> {
        let index = option.index as c_int;
        let Some(descriptor) = self.descriptor(index) else {
            return Err(BackendError::Read {
                option: option.name.clone(),
                reason: "no option descriptor".to_string(),
            });
        };

        match descriptor.value_type {
            ffi::TYPE_GROUP => Ok(OptionValue::Group),
            ffi::TYPE_BUTTON => Ok(OptionValue::Button),
            ffi::TYPE_BOOL | ffi::TYPE_INT | ffi::TYPE_FIXED => {
                let value_type = descriptor.value_type;
                let mut word: c_int = 0;
                let status = unsafe {
                    ffi::sane_control_option(
                        self.handle,
                        index,
                        ffi::ACTION_GET_VALUE,
                        (&mut word as *mut c_int).cast::<c_void>(),
                        ptr::null_mut(),
                    )
                };
                if status != ffi::STATUS_GOOD {
                    return Err(BackendError::Read {
                        option: option.name.clone(),
                        reason: status_string(status),
                    });
                }
                Ok(match value_type {
                    ffi::TYPE_BOOL => OptionValue::Bool(word != 0),
                    ffi::TYPE_FIXED => OptionValue::Fixed(Fixed::from_raw(word)),
                    _ => OptionValue::Int(word),
                })
            }
            ffi::TYPE_STRING => {
                let size = descriptor.size.max(1) as usize;
                let mut buffer = vec![0u8; size];
                let status = unsafe {
                    ffi::sane_control_option(
                        self.handle,
                        index,
                        ffi::ACTION_GET_VALUE,
                        buffer.as_mut_ptr().cast::<c_void>(),
                        ptr::null_mut(),
                    )
                };
                if status != ffi::STATUS_GOOD {
                    return Err(BackendError::Read {
                        option: option.name.clone(),
                        reason: status_string(status),
                    });
                }
                let text = CStr::from_bytes_until_nul(&buffer)
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(OptionValue::String(text))
            }
            other => Err(BackendError::Read {
                option: option.name.clone(),
                reason: format!("unsupported value type {}", other),
            }),
        }
    }
}
