// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device polling worker.
//!
//! One thread per device. On startup the worker opens the device, resolves
//! configured actions and functions against the device's option list, then
//! polls option values on a fixed cadence, firing scripts on configured
//! transitions or on external trigger requests. The device handle is closed
//! around every script run so the script may use the scanner itself.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::Mutex;
use sbd_adapters::{ScanBackend, ScanDevice};
use sbd_config::{ActionDef, FunctionDef, GlobalSection, SharedConfig};
use sbd_core::{
    full_match_regex, Action, DeviceInfo, Function, IntTrigger, Observation, OptionInfo,
    OptionValue, StringTrigger, TriggerFlag, TriggerValue,
};
use tracing::{debug, error, info, warn};

use crate::script;
use crate::signals;

/// Action names and trigger flags of a running worker, shared with the
/// supervisor so external commands can request fires.
#[derive(Clone, Default)]
pub(crate) struct TriggerRegistry {
    inner: Arc<Mutex<Vec<(String, TriggerFlag)>>>,
}

impl TriggerRegistry {
    fn register(&self, name: &str, flag: TriggerFlag) {
        self.inner.lock().push((name.to_string(), flag));
    }

    /// Request a fire of every action with the given name. Returns whether
    /// any action matched.
    pub(crate) fn fire(&self, action_name: &str) -> bool {
        let entries = self.inner.lock();
        let mut matched = false;
        for (name, flag) in entries.iter() {
            if name == action_name {
                flag.set();
                matched = true;
            }
        }
        matched
    }
}

/// Handle to one device polling thread.
pub(crate) struct PollHandler {
    device_name: String,
    terminate: Arc<AtomicBool>,
    triggers: TriggerRegistry,
    thread: Option<JoinHandle<()>>,
}

impl PollHandler {
    /// Spawn the polling thread for a device.
    pub(crate) fn spawn<B: ScanBackend>(
        backend: B,
        info: DeviceInfo,
        config: SharedConfig,
    ) -> std::io::Result<Self> {
        let terminate = Arc::new(AtomicBool::new(false));
        let triggers = TriggerRegistry::default();
        let device_name = info.name.clone();
        let thread = thread::Builder::new()
            .name(format!("poll-{}", info.name))
            .spawn({
                let terminate = Arc::clone(&terminate);
                let triggers = triggers.clone();
                move || {
                    signals::mask_thread_signals();
                    poll_device(backend, info, config, &terminate, &triggers);
                }
            })?;
        Ok(Self {
            device_name,
            terminate,
            triggers,
            thread: Some(thread),
        })
    }

    pub(crate) fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Ask the worker to stop at the next iteration boundary.
    pub(crate) fn request_stop(&self) {
        self.terminate.store(true, Ordering::SeqCst);
    }

    pub(crate) fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(device = %self.device_name, "polling thread panicked");
            }
        }
    }

    /// Set the trigger flag of every action with the given name.
    pub(crate) fn trigger(&self, action_name: &str) -> bool {
        self.triggers.fire(action_name)
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

/// The worker thread body.
fn poll_device<B: ScanBackend>(
    backend: B,
    info: DeviceInfo,
    config: SharedConfig,
    terminate: &AtomicBool,
    triggers: &TriggerRegistry,
) {
    let mut device = match backend.open(&info) {
        Ok(device) => device,
        Err(e) => {
            error!(device = %info.name, error = %e, "couldn't open device");
            return;
        }
    };

    let cfg = config.current();
    let Some(global) = cfg.global.as_ref() else {
        error!(device = %info.name, "config has no global section");
        return;
    };

    let options = match device.options() {
        Ok(options) => options,
        Err(e) => {
            error!(device = %info.name, error = %e, "couldn't list device options");
            return;
        }
    };

    // One read per option for the whole setup; some backends reset state
    // (e.g. a pressed button) when an option is read.
    let snapshot: Vec<(OptionInfo, Option<OptionValue>)> = options
        .into_iter()
        .map(|option| {
            let value = device.read_value(&option).ok();
            (option, value)
        })
        .collect();

    let mut actions: Vec<Action> = Vec::new();
    let mut functions: Vec<Function> = Vec::new();

    find_matching_actions(
        &mut actions,
        &snapshot,
        &global.actions,
        global.multiple_actions(),
        &info,
    );
    find_matching_functions(&mut functions, &snapshot, &global.functions, &info);

    for (section_name, section) in &cfg.devices {
        let filter = match full_match_regex(&section.filter) {
            Ok(filter) => filter,
            Err(e) => {
                warn!(section = %section_name, error = %e, "couldn't compile device filter regex");
                continue;
            }
        };
        if !filter.is_match(&info.name) {
            continue;
        }
        info!(device = %info.name, section = %section_name, "found local actions for device");
        find_matching_actions(
            &mut actions,
            &snapshot,
            &section.actions,
            global.multiple_actions(),
            &info,
        );
        find_matching_functions(&mut functions, &snapshot, &section.functions, &info);
    }

    for action in &actions {
        triggers.register(action.name(), action.trigger());
    }

    let timeout = Duration::from_millis(global.timeout());

    info!(
        device = %info.name,
        actions = actions.len(),
        functions = functions.len(),
        "start polling"
    );

    while !terminate.load(Ordering::SeqCst) {
        let mut index = 0;
        while index < actions.len() {
            // First use per iteration wins: a later action bound to the same
            // option reuses the value instead of reading it again.
            let reused = actions[..index]
                .iter()
                .find(|earlier| earlier.option() == actions[index].option())
                .and_then(|earlier| earlier.current().cloned());
            let value = match reused {
                Some(value) => value,
                None => match device.read_value(actions[index].option()) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(
                            device = %info.name,
                            option = %actions[index].option(),
                            error = %e,
                            "couldn't get current value of option"
                        );
                        index += 1;
                        continue;
                    }
                },
            };

            let fired = match actions[index].observe(value) {
                Observation::Baseline => false,
                Observation::KindMismatch { last, current } => {
                    error!(
                        device = %info.name,
                        option = %actions[index].option(),
                        last = %last,
                        current = %current,
                        "value kind of action changed, should never happen"
                    );
                    actions[index].take_trigger()
                }
                // Non-short-circuit: a pending trigger is consumed even when
                // the transition alone already fires.
                Observation::Compared { transition } => transition | actions[index].take_trigger(),
            };

            if fired {
                info!(device = %info.name, action = %actions[index].name(), "action fired");
                match fire_action(
                    &backend,
                    &info,
                    device,
                    index,
                    &actions,
                    &functions,
                    global,
                    config.path(),
                    timeout,
                ) {
                    Ok(reopened) => {
                        device = reopened;
                        actions[index].reset_baseline();
                    }
                    Err(()) => return,
                }
            }
            index += 1;
        }
        thread::sleep(timeout);
    }

    info!(device = %info.name, "stopped polling");
}

/// Fire one action: build the script environment, release the device, run
/// the script, and reopen the device.
#[allow(clippy::too_many_arguments)]
fn fire_action<B: ScanBackend>(
    backend: &B,
    info: &DeviceInfo,
    device: B::Device,
    index: usize,
    actions: &[Action],
    functions: &[Function],
    global: &GlobalSection,
    config_path: &Path,
    timeout: Duration,
) -> Result<B::Device, ()> {
    let mut device = device;
    let action = &actions[index];

    let mut env = script::base_environment();
    env.push((global.env_device().to_string(), info.name.clone()));
    env.push((global.env_action().to_string(), action.name().to_string()));

    for function in functions {
        // Same first-use rule as the poll scan: a value an action read this
        // iteration is reused instead of read again.
        let value = match actions.iter().find(|a| a.option() == function.option()) {
            Some(bound) => bound.current().cloned(),
            None => device.read_value(function.option()).ok(),
        };
        let Some(value) = value else {
            continue;
        };
        match value.as_env_str() {
            Some(rendered) => env.push((function.env().to_string(), rendered)),
            None => debug!(option = %function.option(), "function option has unsupported kind"),
        }
    }

    info!(device = %info.name, "closing device");
    drop(device);

    let path = sbd_config::script_path(action.script(), global.scriptdir.as_deref(), config_path);
    if !path.exists() {
        warn!(script = %path.display(), "script does not exist, skipping");
    } else {
        // Debounce before handing the device to the script.
        thread::sleep(timeout);
        let _ = script::run(&path, &env);
    }

    info!(device = %info.name, "reopening device");
    backend.open(info).map_err(|e| {
        error!(device = %info.name, error = %e, "couldn't reopen device");
    })
}

/// Bind each action section whose filter matches a device option.
fn find_matching_actions(
    actions: &mut Vec<Action>,
    snapshot: &[(OptionInfo, Option<OptionValue>)],
    defs: &IndexMap<String, ActionDef>,
    multiple_actions: bool,
    info: &DeviceInfo,
) {
    for (name, def) in defs {
        let filter = match full_match_regex(&def.filter) {
            Ok(filter) => filter,
            Err(e) => {
                warn!(action = %name, error = %e, "couldn't compile action filter regex");
                continue;
            }
        };
        let Some(script) = def.script.as_deref() else {
            warn!(action = %name, "no script set");
            continue;
        };

        for (option, value) in snapshot {
            if !filter.is_match(&option.name) {
                continue;
            }
            let Some(value) = value else {
                error!(device = %info.name, option = %option, "couldn't get value of option");
                continue;
            };
            if !value.is_data() {
                continue;
            }

            let (from_value, to_value) = trigger_pair(name, def, value);
            let existing = if multiple_actions {
                None
            } else {
                actions.iter().position(|a| a.option() == option)
            };
            match existing {
                Some(bound) => {
                    info!(
                        device = %info.name,
                        old = %actions[bound].name(),
                        new = %name,
                        option = %option,
                        "overwriting existing action"
                    );
                    actions[bound].rebind(
                        name.as_str(),
                        script,
                        from_value,
                        to_value,
                        Some(value.clone()),
                    );
                }
                None => {
                    info!(device = %info.name, action = %name, option = %option, "adding new action");
                    actions.push(
                        Action::new(option.clone(), name.as_str(), script, from_value, to_value)
                            .with_last(value.clone()),
                    );
                }
            }
        }
    }
}

/// Pick the from/to trigger pair for an option, based on its value kind.
/// Missing trigger sections and broken regexes fall back to the defaults.
fn trigger_pair(action_name: &str, def: &ActionDef, value: &OptionValue) -> (TriggerValue, TriggerValue) {
    if value.kind().is_numeric() {
        match def.numerical_trigger.as_ref() {
            Some(trigger) => (
                TriggerValue::Int(IntTrigger(trigger.from_value)),
                TriggerValue::Int(IntTrigger(trigger.to_value)),
            ),
            None => {
                warn!(action = %action_name, "no numerical trigger values set, using defaults");
                TriggerValue::default_numeric_pair()
            }
        }
    } else {
        match def.string_trigger.as_ref() {
            Some(trigger) => {
                let from = StringTrigger::new(trigger.from_value.as_str());
                let to = StringTrigger::new(trigger.to_value.as_str());
                match (from, to) {
                    (Ok(from), Ok(to)) => (TriggerValue::String(from), TriggerValue::String(to)),
                    _ => {
                        warn!(action = %action_name, "couldn't compile string trigger regex, using defaults");
                        TriggerValue::default_string_pair()
                    }
                }
            }
            None => {
                warn!(action = %action_name, "no string trigger values set, using defaults");
                TriggerValue::default_string_pair()
            }
        }
    }
}

/// Bind each function section whose filter matches a device option.
fn find_matching_functions(
    functions: &mut Vec<Function>,
    snapshot: &[(OptionInfo, Option<OptionValue>)],
    defs: &IndexMap<String, FunctionDef>,
    info: &DeviceInfo,
) {
    for (name, def) in defs {
        let filter = match full_match_regex(&def.filter) {
            Ok(filter) => filter,
            Err(e) => {
                warn!(function = %name, error = %e, "couldn't compile function filter regex");
                continue;
            }
        };
        let Some(env) = def.env.as_deref() else {
            warn!(function = %name, "no env set");
            continue;
        };

        for (option, _value) in snapshot {
            if !filter.is_match(&option.name) {
                continue;
            }
            if let Some(existing) = functions.iter_mut().find(|f| f.option() == option) {
                warn!(
                    device = %info.name,
                    function = %name,
                    option = %option,
                    "overriding environment variable of function"
                );
                existing.set_env(env);
            } else {
                functions.push(Function::new(option.clone(), env));
            }
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
