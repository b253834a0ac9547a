// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal front-end.
//!
//! Signal handlers never touch the supervisor: signal-hook queues the raw
//! signal over its internal self-pipe and the main thread turns it into a
//! supervisor operation. Worker threads block all signals so delivery stays
//! on the main thread.

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook::iterator::Signals;
use tracing::warn;

/// A control signal, translated to the operation it requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    /// SIGHUP: reload the config, then restart the fleet.
    Reload,
    /// SIGUSR1: stop the fleet.
    StopFleet,
    /// SIGUSR2: start the fleet.
    StartFleet,
    /// SIGTERM / SIGINT: orderly shutdown.
    Shutdown,
}

/// Installed handlers for the daemon's control signals.
pub struct SignalListener {
    signals: Signals,
}

impl SignalListener {
    /// Install the handlers. Failure here is fatal at startup.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            signals: Signals::new([SIGHUP, SIGUSR1, SIGUSR2, SIGTERM, SIGINT])?,
        })
    }

    /// Block until the next control signal arrives.
    pub fn wait(&mut self) -> SignalEvent {
        for signal in self.signals.forever() {
            match signal {
                SIGHUP => return SignalEvent::Reload,
                SIGUSR1 => return SignalEvent::StopFleet,
                SIGUSR2 => return SignalEvent::StartFleet,
                SIGTERM | SIGINT => return SignalEvent::Shutdown,
                _ => {}
            }
        }
        // The iterator only ends when the handle is closed.
        SignalEvent::Shutdown
    }
}

/// Block every signal for the calling thread. Workers call this on entry so
/// all control signals are delivered to the main thread.
pub fn mask_thread_signals() {
    let mask = nix::sys::signal::SigSet::all();
    if let Err(e) = mask.thread_block() {
        warn!(error = %e, "couldn't mask signals for worker thread");
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
