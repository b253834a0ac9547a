// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hot-plug front-end.
//!
//! Watches the USB device event stream; when a `usb_device` is added or
//! removed the fleet is stopped, the configured insert/remove hook script
//! runs, and the fleet is restarted from a fresh device enumeration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sbd_adapters::hotplug::USB_DEVICE_TYPE;
use sbd_adapters::{HotplugAction, HotplugMonitor, ScanBackend};
use sbd_config::SharedConfig;
use tracing::{error, info, warn};

use crate::script;
use crate::signals;
use crate::supervisor::Supervisor;

/// Device name hook scripts see; a hot-plug event carries no scanner name.
pub const HOOK_DEVICE_NAME: &str = "dbus device";

/// Upper bound for one wait on the device event stream.
const EVENT_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle to the hot-plug monitor thread.
pub struct HotplugHandler {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl HotplugHandler {
    /// Start the monitor thread.
    pub fn start<B: ScanBackend, M: HotplugMonitor>(
        monitor: M,
        supervisor: Arc<Supervisor<B>>,
        config: SharedConfig,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread = thread::Builder::new().name("hotplug".to_string()).spawn({
            let stop = Arc::clone(&stop);
            move || {
                signals::mask_thread_signals();
                monitor_loop(monitor, &supervisor, &config, &stop);
            }
        })?;
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Stop the monitor and wait for it.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("hotplug thread panicked");
            }
        }
    }
}

fn monitor_loop<B: ScanBackend, M: HotplugMonitor>(
    mut monitor: M,
    supervisor: &Supervisor<B>,
    config: &SharedConfig,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::SeqCst) {
        match monitor.recv_timeout(EVENT_TIMEOUT) {
            Ok(Some(event)) if event.device_type == USB_DEVICE_TYPE => match event.action {
                HotplugAction::Add => device_added(supervisor, config),
                HotplugAction::Remove => device_removed(supervisor, config),
            },
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "device monitor failed");
                break;
            }
        }
    }
}

fn device_added<B: ScanBackend>(supervisor: &Supervisor<B>, config: &SharedConfig) {
    info!("usb device added, restarting polling threads");
    supervisor.stop();
    run_hook(config, Hook::Insert);
    supervisor.start();
}

fn device_removed<B: ScanBackend>(supervisor: &Supervisor<B>, config: &SharedConfig) {
    info!("usb device removed, restarting polling threads");
    supervisor.stop();
    run_hook(config, Hook::Remove);
    supervisor.start();
}

enum Hook {
    Insert,
    Remove,
}

/// Run the configured insert/remove hook script, if any.
fn run_hook(config: &SharedConfig, hook: Hook) {
    let cfg = config.current();
    let Some(global) = cfg.global.as_ref() else {
        return;
    };
    let (script, action) = match hook {
        Hook::Insert => (global.device_insert_script.as_deref(), "insert"),
        Hook::Remove => (global.device_remove_script.as_deref(), "remove"),
    };
    let Some(script) = script else {
        return;
    };

    let mut env = script::base_environment();
    env.push((global.env_device().to_string(), HOOK_DEVICE_NAME.to_string()));
    env.push((global.env_action().to_string(), action.to_string()));

    let path = sbd_config::script_path(script, global.scriptdir.as_deref(), config.path());
    if !path.exists() {
        warn!(script = %path.display(), "hook script does not exist, skipping");
        return;
    }
    let _ = script::run(&path, &env);
}

#[cfg(test)]
#[path = "hotplug_tests.rs"]
mod tests;
