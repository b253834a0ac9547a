// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime flags merged from the command line and the `global` section.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

/// Thread-safe holder for the flags the daemon was started with.
#[derive(Clone, Default)]
pub struct RunConfig {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    debug: bool,
    debug_level: u8,
    foreground: bool,
    config_path: PathBuf,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(&self) -> bool {
        self.inner.lock().debug
    }

    pub fn set_debug(&self, debug: bool) {
        self.inner.lock().debug = debug;
    }

    pub fn debug_level(&self) -> u8 {
        self.inner.lock().debug_level
    }

    pub fn set_debug_level(&self, level: u8) {
        self.inner.lock().debug_level = level;
    }

    pub fn foreground(&self) -> bool {
        self.inner.lock().foreground
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.inner.lock().foreground = foreground;
    }

    pub fn config_path(&self) -> PathBuf {
        self.inner.lock().config_path.clone()
    }

    pub fn set_config_path(&self, path: impl Into<PathBuf>) {
        self.inner.lock().config_path = path.into();
    }
}
