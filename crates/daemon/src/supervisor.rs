// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet lifecycle: one polling worker per attached scanner.
//!
//! `start`, `stop` and `trigger_action` are serialized by the workers lock.
//! Signal handlers never call in here directly; they set flags the main
//! thread acts on, so a reload's stop/start sequence runs linearly.

use parking_lot::Mutex;
use sbd_adapters::ScanBackend;
use sbd_config::{GlobalSection, SharedConfig};
use tracing::{error, info, warn};

use crate::poller::PollHandler;

pub struct Supervisor<B: ScanBackend> {
    backend: B,
    config: SharedConfig,
    workers: Mutex<Vec<PollHandler>>,
}

impl<B: ScanBackend> Supervisor<B> {
    pub fn new(backend: B, config: SharedConfig) -> Self {
        Self {
            backend,
            config,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Enumerate devices and start one worker per device. Idempotent while
    /// the fleet is running.
    pub fn start(&self) {
        let mut workers = self.workers.lock();
        if !workers.is_empty() {
            return;
        }

        let local_only = self
            .config
            .current()
            .global
            .as_ref()
            .map_or(true, GlobalSection::local_only);
        let devices = match self.backend.devices(local_only) {
            Ok(devices) => devices,
            Err(e) => {
                error!(error = %e, "couldn't enumerate devices");
                return;
            }
        };

        for info in devices {
            if workers.iter().any(|w| w.device_name() == info.name) {
                warn!(device = %info.name, "device enumerated twice, keeping first worker");
                continue;
            }
            info!(device = %info.name, "starting polling thread for device");
            let name = info.name.clone();
            match PollHandler::spawn(self.backend.clone(), info, self.config.clone()) {
                Ok(handler) => workers.push(handler),
                Err(e) => error!(device = %name, error = %e, "couldn't spawn polling thread"),
            }
        }
    }

    /// Stop and join every worker. Idempotent while the fleet is empty.
    pub fn stop(&self) {
        let mut workers = self.workers.lock();
        if workers.is_empty() {
            return;
        }

        info!(count = workers.len(), "stopping polling threads");
        for worker in workers.iter() {
            worker.request_stop();
        }
        for mut worker in workers.drain(..) {
            worker.join();
        }
    }

    /// Route an external trigger to the worker of the named device.
    pub fn trigger_action(&self, device_name: &str, action_name: &str) {
        let workers = self.workers.lock();
        let Some(worker) = workers.iter().find(|w| w.device_name() == device_name) else {
            warn!(device = %device_name, "no polling thread for device");
            return;
        };
        if !worker.trigger(action_name) {
            warn!(device = %device_name, action = %action_name, "no matching action");
        }
    }

    /// Names of the devices currently owned by workers.
    pub fn device_names(&self) -> Vec<String> {
        self.workers
            .lock()
            .iter()
            .map(|w| w.device_name().to_string())
            .collect()
    }

    pub fn is_running(&self) -> bool {
        !self.workers.lock().is_empty()
    }
}

impl<B: ScanBackend> Drop for Supervisor<B> {
    /// The last holder stops the fleet.
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
