// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script execution with a constructed environment.
//!
//! Scripts run with exactly the environment built for them, nothing
//! inherited. The base set is `PATH`, `PWD`, `USER` and `HOME`, falling back
//! to the working directory and the effective user's passwd entry when the
//! daemon's own environment is bare.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use tracing::{error, info, warn};

/// Search path used when the daemon itself has no `PATH`.
pub const FALLBACK_PATH: &str = "/usr/sbin:/usr/bin:/sbin:/bin";

/// Build the base environment every fired script receives.
pub fn base_environment() -> Vec<(String, String)> {
    let mut env = Vec::new();

    env.push((
        "PATH".to_string(),
        std::env::var("PATH").unwrap_or_else(|_| FALLBACK_PATH.to_string()),
    ));

    match std::env::var("PWD") {
        Ok(pwd) => env.push(("PWD".to_string(), pwd)),
        Err(_) => match std::env::current_dir() {
            Ok(dir) => env.push(("PWD".to_string(), dir.display().to_string())),
            Err(e) => warn!(error = %e, "couldn't get working directory"),
        },
    }

    match std::env::var("USER") {
        Ok(user) => env.push(("USER".to_string(), user)),
        Err(_) => match passwd_entry() {
            Some(user) => env.push(("USER".to_string(), user.name)),
            None => warn!("couldn't determine user name"),
        },
    }

    match std::env::var("HOME") {
        Ok(home) => env.push(("HOME".to_string(), home)),
        Err(_) => match passwd_entry() {
            Some(user) => env.push(("HOME".to_string(), user.dir.display().to_string())),
            None => warn!("couldn't determine home directory"),
        },
    }

    env
}

/// The effective user's passwd entry.
fn passwd_entry() -> Option<nix::unistd::User> {
    nix::unistd::User::from_uid(nix::unistd::geteuid())
        .ok()
        .flatten()
}

/// Run a script with exactly the given environment and wait for it.
///
/// The script path doubles as argv[0]; there are no arguments. The exit
/// code or terminating signal is logged.
pub fn run(path: &Path, env: &[(String, String)]) -> std::io::Result<ExitStatus> {
    info!(script = %path.display(), "starting script");
    let status = Command::new(path)
        .env_clear()
        .envs(env.iter().map(|(key, value)| (key.as_str(), value.as_str())))
        .stdin(Stdio::null())
        .status();

    match &status {
        Ok(status) => {
            use std::os::unix::process::ExitStatusExt;
            if let Some(code) = status.code() {
                info!(script = %path.display(), code, "script exited");
            } else if let Some(signal) = status.signal() {
                info!(script = %path.display(), signal, "script terminated by signal");
            }
        }
        Err(e) => error!(script = %path.display(), error = %e, "couldn't execute script"),
    }

    status
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
