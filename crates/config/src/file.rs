// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serde model of the sbd configuration file.
//!
//! The file has a `global` section with daemon-wide settings plus `action`
//! and `function` multisections, a `device` multisection with per-device
//! overrides, and a top-level `include` directive. Multisections keep file
//! order, which fixes the order actions are evaluated in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default poll interval in milliseconds.
pub const TIMEOUT_DEF_MS: u64 = 500;

/// Default pidfile and pipe paths, relative to the working directory.
pub const PIDFILE_DEF: &str = "scanbd.pid";
pub const PIPEFILE_DEF: &str = "scanbd.pipe";

/// Default environment variable names for fired scripts.
pub const ENV_DEVICE_DEF: &str = "SCANBD_DEVICE";
pub const ENV_ACTION_DEF: &str = "SCANBD_ACTION";

/// A parsed configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub global: Option<GlobalSection>,
    #[serde(default, rename = "device")]
    pub devices: IndexMap<String, DeviceSection>,
    #[serde(default)]
    pub include: Option<IncludeList>,
}

/// One path or a list of paths for the `include` directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncludeList {
    One(String),
    Many(Vec<String>),
}

impl IncludeList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            IncludeList::One(path) => vec![path],
            IncludeList::Many(paths) => paths,
        }
    }
}

/// The `global` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSection {
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default, rename = "debug-level")]
    pub debug_level: Option<u8>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub group: Option<String>,

    // Manager-mode settings; parsed so real-world files load, unused here.
    #[serde(default)]
    pub saned: Option<String>,
    #[serde(default, rename = "saned_opt")]
    pub saned_opts: Option<Vec<String>>,
    #[serde(default, rename = "saned_env")]
    pub saned_envs: Option<Vec<String>>,

    #[serde(default)]
    pub scriptdir: Option<String>,
    #[serde(default)]
    pub device_insert_script: Option<String>,
    #[serde(default)]
    pub device_remove_script: Option<String>,

    // Scalar settings stay unset until read so include merging can tell
    // absent from default; the accessors below apply the defaults.
    /// Poll interval in milliseconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub pidfile: Option<String>,
    #[serde(default)]
    pub pipefile: Option<String>,
    /// Allow several actions to bind the same device option.
    #[serde(default)]
    pub multiple_actions: Option<bool>,
    /// Restrict device enumeration to locally attached scanners.
    #[serde(default)]
    pub local_only: Option<bool>,

    #[serde(default)]
    pub environment: Option<EnvNames>,
    #[serde(default, rename = "function")]
    pub functions: IndexMap<String, FunctionDef>,
    #[serde(default, rename = "action")]
    pub actions: IndexMap<String, ActionDef>,
}

impl GlobalSection {
    /// Poll interval with the default applied.
    pub fn timeout(&self) -> u64 {
        self.timeout.unwrap_or(TIMEOUT_DEF_MS)
    }

    pub fn pidfile(&self) -> &str {
        self.pidfile.as_deref().unwrap_or(PIDFILE_DEF)
    }

    pub fn pipefile(&self) -> &str {
        self.pipefile.as_deref().unwrap_or(PIPEFILE_DEF)
    }

    pub fn multiple_actions(&self) -> bool {
        self.multiple_actions.unwrap_or(true)
    }

    pub fn local_only(&self) -> bool {
        self.local_only.unwrap_or(true)
    }

    /// Name of the environment variable carrying the device name.
    pub fn env_device(&self) -> &str {
        self.environment
            .as_ref()
            .map_or(ENV_DEVICE_DEF, |env| env.device.as_str())
    }

    /// Name of the environment variable carrying the action name.
    pub fn env_action(&self) -> &str {
        self.environment
            .as_ref()
            .map_or(ENV_ACTION_DEF, |env| env.action.as_str())
    }
}

/// Names of the environment variables passed to fired scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvNames {
    #[serde(default = "default_env_device")]
    pub device: String,
    #[serde(default = "default_env_action")]
    pub action: String,
}

impl Default for EnvNames {
    fn default() -> Self {
        Self {
            device: default_env_device(),
            action: default_env_action(),
        }
    }
}

/// One `action` block: a filter over option names plus the script to run
/// when the watched option transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDef {
    pub filter: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default, rename = "numerical-trigger")]
    pub numerical_trigger: Option<NumericalTriggerDef>,
    #[serde(default, rename = "string-trigger")]
    pub string_trigger: Option<StringTriggerDef>,
}

/// Trigger values for options with a numeric kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumericalTriggerDef {
    #[serde(default = "default_from_int", rename = "from-value")]
    pub from_value: i32,
    #[serde(default = "default_to_int", rename = "to-value")]
    pub to_value: i32,
}

/// Trigger patterns for options with a string kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringTriggerDef {
    #[serde(default = "default_from_str", rename = "from-value")]
    pub from_value: String,
    #[serde(default = "default_to_str", rename = "to-value")]
    pub to_value: String,
}

/// One `function` block: exports matching options into script environments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionDef {
    pub filter: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub env: Option<String>,
}

/// One `device` block: overrides for devices whose name matches `filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSection {
    pub filter: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default, rename = "action")]
    pub actions: IndexMap<String, ActionDef>,
    #[serde(default, rename = "function")]
    pub functions: IndexMap<String, FunctionDef>,
}

fn default_env_device() -> String {
    ENV_DEVICE_DEF.to_string()
}

fn default_env_action() -> String {
    ENV_ACTION_DEF.to_string()
}

fn default_from_int() -> i32 {
    0
}

fn default_to_int() -> i32 {
    1
}

fn default_from_str() -> String {
    String::new()
}

fn default_to_str() -> String {
    ".+".to_string()
}
