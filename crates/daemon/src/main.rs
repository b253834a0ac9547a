// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sbd daemon (sbdd)
//!
//! Long-running process that polls buttons and sensors on attached scanners
//! and runs configured scripts when a watched option transitions. Also
//! doubles as the one-shot trigger client: `sbdd -t DEVICE -a ACTION`
//! writes one message to the daemon's pipe and exits.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sbd_config::{RunConfig, SharedConfig};
use sbd_daemon::hotplug::HotplugHandler;
use sbd_daemon::lifecycle::{self, LifecycleError};
use sbd_daemon::pipe::{self, PipeHandler};
use sbd_daemon::signals::{SignalEvent, SignalListener};
use sbd_daemon::Supervisor;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "sbdd", version, about = "sbd is a scanner button daemon")]
struct Cli {
    /// Enable debug logging at the given level (1 = errors only, 7 = everything)
    #[arg(short, long, value_name = "LEVEL")]
    debug: Option<u8>,

    /// Stay in the foreground instead of daemonizing
    #[arg(short, long)]
    foreground: bool,

    /// Use a custom config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Device to trigger an action on (use together with --action)
    #[arg(short, long, value_name = "DEVICE")]
    trigger: Option<String>,

    /// Action to trigger (use together with --trigger)
    #[arg(short, long, value_name = "ACTION")]
    action: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sbdd: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), LifecycleError> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Path::new(sbd_config::CFG_DIR).join("scanbd.conf"));
    let config = SharedConfig::load(&config_path)?;

    // One-shot trigger mode: write one pipe message and exit.
    if cli.trigger.is_some() || cli.action.is_some() {
        let (Some(device), Some(action)) = (cli.trigger.as_deref(), cli.action.as_deref()) else {
            return Err(LifecycleError::IncompleteTrigger);
        };
        let message = format!("{},{}", device, action);
        pipe::write_message(&pipe::pipe_path(&config.current()), &message)?;
        return Ok(());
    }

    let run_config = RunConfig::new();
    run_config.set_config_path(&config_path);
    run_config.set_foreground(cli.foreground);
    if let Some(level) = cli.debug {
        run_config.set_debug(true);
        run_config.set_debug_level(level);
    }
    let pidfile_path = {
        let cfg = config.current();
        if let Some(global) = cfg.global.as_ref() {
            if global.debug.unwrap_or(false) {
                run_config.set_debug(true);
            }
            if run_config.debug() {
                if let Some(level) = global.debug_level {
                    run_config.set_debug_level(level);
                }
            }
            PathBuf::from(global.pidfile())
        } else {
            PathBuf::from(sbd_config::PIDFILE_DEF)
        }
    };

    let log_path = pidfile_path.with_extension("log");
    let _log_guard = lifecycle::setup_logging(&run_config, &log_path)?;

    if !run_config.foreground() {
        info!("daemonizing");
        lifecycle::daemonize()?;
    }

    {
        let cfg = config.current();
        if let Some(global) = cfg.global.as_ref() {
            lifecycle::drop_privileges(global)?;
        }
    }

    let _pidfile = if run_config.foreground() {
        None
    } else {
        Some(lifecycle::Pidfile::acquire(&pidfile_path)?)
    };

    let mut signal_listener = SignalListener::install().map_err(LifecycleError::Signals)?;

    let supervisor = Arc::new(Supervisor::new(backend()?, config.clone()));
    supervisor.start();

    let hotplug = start_hotplug(&supervisor, &config);
    let pipe = PipeHandler::start(pipe::pipe_path(&config.current()), Arc::clone(&supervisor))?;

    info!(config = %config_path.display(), "sbdd ready");

    loop {
        match signal_listener.wait() {
            SignalEvent::Reload => {
                info!("reloading configuration");
                if let Err(e) = config.reload() {
                    error!(error = %e, "config failed to parse, keeping previous configuration");
                }
                supervisor.stop();
                supervisor.start();
            }
            SignalEvent::StopFleet => {
                info!("stopping polling threads on request");
                supervisor.stop();
            }
            SignalEvent::StartFleet => {
                info!("starting polling threads on request");
                supervisor.start();
            }
            SignalEvent::Shutdown => break,
        }
    }

    info!("shutting down");
    supervisor.stop();
    if let Some(handler) = hotplug {
        handler.stop();
    }
    pipe.stop();
    info!("sbdd stopped");
    Ok(())
}

#[cfg(feature = "libsane")]
fn backend() -> Result<sbd_adapters::SaneBackend, LifecycleError> {
    sbd_adapters::SaneBackend::init().map_err(|e| LifecycleError::Backend(e.to_string()))
}

#[cfg(not(feature = "libsane"))]
fn backend() -> Result<sbd_adapters::StubBackend, LifecycleError> {
    warn!("built without the libsane feature, no scanners will be found");
    Ok(sbd_adapters::StubBackend::new())
}

/// Start the hot-plug watcher; without a watchable USB device tree the
/// daemon still runs, only hot-plug restarts are disabled.
fn start_hotplug<B: sbd_adapters::ScanBackend>(
    supervisor: &Arc<Supervisor<B>>,
    config: &SharedConfig,
) -> Option<HotplugHandler> {
    let monitor = match sbd_adapters::UsbMonitor::new() {
        Ok(monitor) => monitor,
        Err(e) => {
            warn!(error = %e, "couldn't watch usb devices, hotplug restart disabled");
            return None;
        }
    };
    match HotplugHandler::start(monitor, Arc::clone(supervisor), config.clone()) {
        Ok(handler) => Some(handler),
        Err(e) => {
            warn!(error = %e, "couldn't start hotplug thread");
            None
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
