// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    absolute_script = { "/opt/scan.sh", Some("scripts"), "/opt/scan.sh" },
    no_scriptdir_uses_config_dir = { "scan.sh", None, "/etc/custom/scan.sh" },
    empty_scriptdir_uses_cfg_dir = { "scan.sh", Some(""), "/etc/scanbd.d/scan.sh" },
    absolute_scriptdir = { "scan.sh", Some("/opt/scripts"), "/opt/scripts/scan.sh" },
    relative_scriptdir_nests_under_cfg_dir = { "scan.sh", Some("scripts"), "/etc/scanbd.d/scripts/scan.sh" },
)]
fn resolution(script: &str, scriptdir: Option<&str>, expected: &str) {
    let config_path = std::path::Path::new("/etc/custom/scanbd.conf");
    assert_eq!(
        script_path(script, scriptdir, config_path),
        std::path::Path::new(expected)
    );
}

#[test]
fn cfg_dir_has_a_default() {
    // Compile-time override via SBD_CFG_DIR; the default is stable.
    assert!(!CFG_DIR.is_empty());
}
