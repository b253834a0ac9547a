// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared, reloadable configuration handle.
//!
//! Readers take a cheap snapshot (`Arc`) and never hold the lock across
//! I/O. A reload parses the file completely before swapping the snapshot,
//! so a broken file leaves the running configuration untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::file::ConfigFile;
use crate::parser::{load_config, ParseError};

#[derive(Clone)]
pub struct SharedConfig {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    current: Mutex<Arc<ConfigFile>>,
}

impl SharedConfig {
    /// Load the configuration file at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ParseError> {
        let path = path.into();
        let config = load_config(&path)?;
        Ok(Self {
            inner: Arc::new(Inner {
                path,
                current: Mutex::new(Arc::new(config)),
            }),
        })
    }

    /// Path the configuration was loaded from.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> Arc<ConfigFile> {
        Arc::clone(&self.inner.current.lock())
    }

    /// Re-read the file, swapping the snapshot only on a successful parse.
    pub fn reload(&self) -> Result<(), ParseError> {
        let config = load_config(&self.inner.path)?;
        *self.inner.current.lock() = Arc::new(config);
        Ok(())
    }
}

#[cfg(test)]
#[path = "shared_tests.rs"]
mod tests;
