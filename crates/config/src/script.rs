// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script path resolution.

use std::path::{Path, PathBuf};

/// Directory the default configuration lives in. Overridable at build time
/// through the `SBD_CFG_DIR` environment variable.
pub const CFG_DIR: &str = match option_env!("SBD_CFG_DIR") {
    Some(dir) => dir,
    None => "/etc/scanbd.d",
};

/// Resolve a configured script value to an absolute path.
///
/// Absolute scripts are used as-is. Relative scripts resolve against
/// `global.scriptdir`: when the key is missing the directory of the loaded
/// config file is used, an empty value means [`CFG_DIR`], an absolute value
/// is used directly and a relative value nests under [`CFG_DIR`].
pub fn script_path(script: &str, scriptdir: Option<&str>, config_path: &Path) -> PathBuf {
    let script = Path::new(script);
    if script.is_absolute() {
        return script.to_path_buf();
    }

    match scriptdir {
        None => config_path
            .parent()
            .unwrap_or_else(|| Path::new(CFG_DIR))
            .join(script),
        Some("") => Path::new(CFG_DIR).join(script),
        Some(dir) if Path::new(dir).is_absolute() => Path::new(dir).join(script),
        Some(dir) => Path::new(CFG_DIR).join(dir).join(script),
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
