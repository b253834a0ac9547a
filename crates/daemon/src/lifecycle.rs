// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup plumbing: logging, daemonizing, privilege drop, pidfile.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use nix::unistd::{setegid, seteuid, Group, User};
use sbd_config::{GlobalSection, RunConfig};
use thiserror::Error;
use tracing::{info, warn};

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Config(#[from] sbd_config::ParseError),

    #[error("--trigger and --action must be used together")]
    IncompleteTrigger,

    #[error("{0}")]
    Pipe(#[from] crate::pipe::PipeError),

    #[error("another instance holds the pidfile {0}")]
    PidfileLocked(PathBuf),

    #[error("no such user: {0}")]
    UnknownUser(String),

    #[error("no such group: {0}")]
    UnknownGroup(String),

    #[error("user or group lookup failed: {0}")]
    Lookup(nix::Error),

    #[error("couldn't daemonize: {0}")]
    Daemonize(nix::Error),

    #[error("couldn't install signal handlers: {0}")]
    Signals(std::io::Error),

    #[error("scanner backend failed: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive pidfile lock. The lock is released and the file removed when
/// the value drops at the end of an orderly shutdown.
#[derive(Debug)]
pub struct Pidfile {
    path: PathBuf,
    // NOTE(lifetime): held to keep the exclusive lock; released on drop
    #[allow(dead_code)]
    file: File,
}

impl Pidfile {
    /// Lock the pidfile and record our pid. Fails when another instance
    /// already holds the lock.
    pub fn acquire(path: &Path) -> Result<Self, LifecycleError> {
        // Open without truncating so a losing race doesn't wipe the
        // running daemon's pid.
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.try_lock_exclusive()
            .map_err(|_| LifecycleError::PidfileLocked(path.to_path_buf()))?;

        let mut file = file;
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Pidfile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(pidfile = %self.path.display(), error = %e, "couldn't remove pidfile");
        }
    }
}

/// Detach from the controlling terminal. Keeps the working directory so
/// relative pidfile and pipe paths stay meaningful.
pub fn daemonize() -> Result<(), LifecycleError> {
    nix::unistd::daemon(true, false).map_err(LifecycleError::Daemonize)
}

/// Drop effective privileges to the configured user and group.
///
/// Unknown names are fatal; failing to actually switch (running unprivileged
/// in the foreground, say) is only a warning.
pub fn drop_privileges(global: &GlobalSection) -> Result<(), LifecycleError> {
    let (Some(user_name), Some(group_name)) = (global.user.as_deref(), global.group.as_deref())
    else {
        warn!("no user or group defined, keeping current privileges");
        return Ok(());
    };

    let group = Group::from_name(group_name)
        .map_err(LifecycleError::Lookup)?
        .ok_or_else(|| LifecycleError::UnknownGroup(group_name.to_string()))?;
    let user = User::from_name(user_name)
        .map_err(LifecycleError::Lookup)?
        .ok_or_else(|| LifecycleError::UnknownUser(user_name.to_string()))?;

    info!(gid = %group.gid, group = %group_name, "dropping privileges to gid");
    if let Err(e) = setegid(group.gid) {
        warn!(gid = %group.gid, error = %e, "couldn't set effective gid");
    }

    info!(uid = %user.uid, user = %user_name, "dropping privileges to uid");
    if let Err(e) = seteuid(user.uid) {
        warn!(uid = %user.uid, error = %e, "couldn't set effective uid");
    }

    Ok(())
}

/// Set up logging: stderr in the foreground, a log file next to the pidfile
/// when daemonized. `RUST_LOG` overrides the configured debug level.
pub fn setup_logging(
    run_config: &RunConfig,
    log_path: &Path,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(run_config)));

    if run_config.foreground() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    }

    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let file_name = log_path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sbdd.log"));

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(Some(guard))
}

/// Map the configured debug level onto a tracing directive.
fn default_directive(run_config: &RunConfig) -> String {
    if !run_config.debug() {
        return "info".to_string();
    }
    let level = match run_config.debug_level() {
        0 | 1 => "error",
        2 => "warn",
        3 => "info",
        4..=6 => "debug",
        _ => "trace",
    };
    level.to_string()
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
