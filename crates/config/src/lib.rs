// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Configuration file parsing and runtime configuration for sbd

mod file;
mod parser;
mod run;
mod script;
mod shared;

pub use file::{
    ActionDef, ConfigFile, DeviceSection, EnvNames, FunctionDef, GlobalSection, IncludeList,
    NumericalTriggerDef, StringTriggerDef, PIDFILE_DEF, PIPEFILE_DEF,
};
pub use parser::{load_config, parse_config, parse_config_with_format, Format, ParseError};
pub use run::RunConfig;
pub use script::{script_path, CFG_DIR};
pub use shared::SharedConfig;
