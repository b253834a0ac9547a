// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration parsing (HCL and TOML) and include resolution.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::file::{ConfigFile, GlobalSection};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Hcl,
    Toml,
}

impl Format {
    /// Pick the format from the file extension. Everything that is not
    /// `.toml` parses as HCL, including the conventional `.conf`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Format::Toml,
            _ => Format::Hcl,
        }
    }
}

/// Errors that can occur while loading a configuration file
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HCL parse error: {0}")]
    Hcl(#[from] hcl::Error),

    #[error("include depth exceeded at {0}")]
    IncludeDepth(PathBuf),
}

/// Includes may nest, but not arbitrarily far.
const MAX_INCLUDE_DEPTH: usize = 8;

/// Parse configuration content as HCL (convenience wrapper)
pub fn parse_config(content: &str) -> Result<ConfigFile, ParseError> {
    parse_config_with_format(content, Format::Hcl)
}

/// Parse configuration content in the given format
pub fn parse_config_with_format(content: &str, format: Format) -> Result<ConfigFile, ParseError> {
    let config: ConfigFile = match format {
        Format::Hcl => hcl::from_str(content)?,
        Format::Toml => toml::from_str(content)?,
    };
    Ok(config)
}

/// Load a configuration file and resolve its `include` directives.
///
/// Included files are parsed with the same format rules and merged into the
/// including file: the includer wins for scalar settings, multisections are
/// appended. Relative include paths resolve against the including file's
/// directory.
pub fn load_config(path: &Path) -> Result<ConfigFile, ParseError> {
    load_with_depth(path, 0)
}

fn load_with_depth(path: &Path, depth: usize) -> Result<ConfigFile, ParseError> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(ParseError::IncludeDepth(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = parse_config_with_format(&content, Format::from_path(path))?;

    let includes = config
        .include
        .take()
        .map(crate::file::IncludeList::into_vec)
        .unwrap_or_default();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    for include in includes {
        let include_path = if Path::new(&include).is_absolute() {
            PathBuf::from(include)
        } else {
            dir.join(include)
        };
        let included = load_with_depth(&include_path, depth + 1)?;
        merge(&mut config, included);
    }

    Ok(config)
}

/// Merge an included file into the including one.
fn merge(base: &mut ConfigFile, other: ConfigFile) {
    match (&mut base.global, other.global) {
        (None, Some(global)) => base.global = Some(global),
        (Some(base_global), Some(other_global)) => merge_global(base_global, other_global),
        _ => {}
    }
    for (name, section) in other.devices {
        base.devices.entry(name).or_insert(section);
    }
}

fn merge_global(base: &mut GlobalSection, other: GlobalSection) {
    // Scalars: the includer wins, the include fills gaps. Settings are
    // still unset here unless the file spelled them out, so an include can
    // fill a gap the includer left to the default.
    base.debug = base.debug.or(other.debug);
    base.debug_level = base.debug_level.or(other.debug_level);
    base.user = base.user.take().or(other.user);
    base.group = base.group.take().or(other.group);
    base.saned = base.saned.take().or(other.saned);
    base.saned_opts = base.saned_opts.take().or(other.saned_opts);
    base.saned_envs = base.saned_envs.take().or(other.saned_envs);
    base.scriptdir = base.scriptdir.take().or(other.scriptdir);
    base.device_insert_script = base
        .device_insert_script
        .take()
        .or(other.device_insert_script);
    base.device_remove_script = base
        .device_remove_script
        .take()
        .or(other.device_remove_script);
    base.timeout = base.timeout.or(other.timeout);
    base.pidfile = base.pidfile.take().or(other.pidfile);
    base.pipefile = base.pipefile.take().or(other.pipefile);
    base.multiple_actions = base.multiple_actions.or(other.multiple_actions);
    base.local_only = base.local_only.or(other.local_only);
    base.environment = base.environment.take().or(other.environment);

    for (name, def) in other.actions {
        base.actions.entry(name).or_insert(def);
    }
    for (name, def) in other.functions {
        base.functions.entry(name).or_insert(def);
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
