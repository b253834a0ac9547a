// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named-pipe front-end.
//!
//! A FIFO carries `device,action` commands from the one-shot trigger mode
//! into the daemon. Messages are a NUL-terminated payload of at most
//! `PIPE_BUF - 1` bytes, so a single write is atomic and a reader never sees
//! a torn record.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nix::sys::stat::Mode;
use sbd_adapters::ScanBackend;
use sbd_config::ConfigFile;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::signals;
use crate::supervisor::Supervisor;

/// Largest message the pipe accepts, the platform's atomic-write bound.
pub const MAX_MESSAGE_SIZE: usize = nix::libc::PIPE_BUF;

/// Pause between reads when the pipe is empty.
const IDLE_SLEEP: Duration = Duration::from_millis(100);

/// Errors from the pipe writer
#[derive(Debug, Error)]
pub enum PipeError {
    #[error("couldn't open pipe {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("message of {size} bytes exceeds the pipe limit of {max}")]
    TooLong { size: usize, max: usize },
    #[error("couldn't write message: {0}")]
    Write(#[from] std::io::Error),
    #[error("short write of {written} of {size} bytes")]
    ShortWrite { written: usize, size: usize },
}

/// The pipe path configured in the `global` section.
pub fn pipe_path(config: &ConfigFile) -> PathBuf {
    config
        .global
        .as_ref()
        .map(|global| PathBuf::from(global.pipefile()))
        .unwrap_or_else(|| PathBuf::from(sbd_config::PIPEFILE_DEF))
}

/// Handle to the pipe reader thread.
pub struct PipeHandler {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PipeHandler {
    /// Create the FIFO and start the reader thread.
    pub fn start<B: ScanBackend>(
        path: PathBuf,
        supervisor: Arc<Supervisor<B>>,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread = thread::Builder::new().name("pipe".to_string()).spawn({
            let stop = Arc::clone(&stop);
            move || {
                signals::mask_thread_signals();
                pipe_thread(&path, &supervisor, &stop);
            }
        })?;
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Stop the reader and wait for it to unlink the FIFO.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("pipe thread panicked");
            }
        }
    }
}

fn pipe_thread<B: ScanBackend>(path: &Path, supervisor: &Supervisor<B>, stop: &AtomicBool) {
    match nix::unistd::mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR) {
        Ok(()) => {}
        Err(nix::errno::Errno::EEXIST) => {
            info!(pipe = %path.display(), "pipe already exists");
        }
        Err(e) => {
            warn!(pipe = %path.display(), error = %e, "error creating pipe");
        }
    }

    let mut pipe = match std::fs::OpenOptions::new()
        .read(true)
        .custom_flags(nix::libc::O_NONBLOCK)
        .open(path)
    {
        Ok(pipe) => pipe,
        Err(e) => {
            error!(pipe = %path.display(), error = %e, "error opening pipe");
            return;
        }
    };

    let mut buffer = [0u8; MAX_MESSAGE_SIZE];
    while !stop.load(Ordering::SeqCst) {
        match pipe.read(&mut buffer) {
            // No writer connected; check again after the idle pause.
            Ok(0) => {}
            Ok(len) => match parse_message(&buffer[..len]) {
                Some((device, action)) => supervisor.trigger_action(&device, &action),
                None => warn!(pipe = %path.display(), "dropping invalid pipe message"),
            },
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => {
                error!(pipe = %path.display(), error = %e, "error reading from pipe");
                break;
            }
        }
        thread::sleep(IDLE_SLEEP);
    }

    drop(pipe);
    if let Err(e) = std::fs::remove_file(path) {
        warn!(pipe = %path.display(), error = %e, "couldn't unlink pipe");
    }
}

/// Parse one message: an ASCII `device,action` payload up to the first NUL.
fn parse_message(bytes: &[u8]) -> Option<(String, String)> {
    let payload = match bytes.iter().position(|&byte| byte == 0) {
        Some(nul) => &bytes[..nul],
        None => bytes,
    };
    let text = std::str::from_utf8(payload).ok()?;

    let mut fields = text.split(',');
    let device = fields.next()?;
    let action = fields.next()?;
    if fields.next().is_some() || device.is_empty() || action.is_empty() {
        return None;
    }
    Some((device.to_string(), action.to_string()))
}

/// Write one `device,action` message, NUL terminator included, in a single
/// atomic write. Fails when no daemon has the read side open.
pub fn write_message(path: &Path, message: &str) -> Result<(), PipeError> {
    if message.len() + 1 > MAX_MESSAGE_SIZE {
        let err = PipeError::TooLong {
            size: message.len() + 1,
            max: MAX_MESSAGE_SIZE,
        };
        error!(error = %err, "refusing pipe message");
        return Err(err);
    }

    let mut pipe = std::fs::OpenOptions::new()
        .write(true)
        .custom_flags(nix::libc::O_NONBLOCK)
        .open(path)
        .map_err(|source| PipeError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut buffer = Vec::with_capacity(message.len() + 1);
    buffer.extend_from_slice(message.as_bytes());
    buffer.push(0);

    let written = pipe.write(&buffer)?;
    if written != buffer.len() {
        return Err(PipeError::ShortWrite {
            written,
            size: buffer.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "pipe_tests.rs"]
mod tests;
