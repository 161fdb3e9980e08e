// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// `spec.md` §6: "writes its pid to the file named by the environment
/// variable `DAEMON_PID_FILEPATH` (mandatory for daemonized start; absence
/// is a startup error with exit code `1`)." `-i` (interactive) start is the
/// one case that tolerates its absence — see `main::run`.
pub const PID_FILEPATH_VAR: &str = "DAEMON_PID_FILEPATH";

/// Path to the LRS config file. Defaults to `/etc/lrs/lrs.toml`, overridable
/// for tests and non-standard installs.
pub const CONFIG_PATH_VAR: &str = "LRS_CONFIG";

pub fn pid_filepath() -> Result<PathBuf, LifecycleError> {
    std::env::var(PID_FILEPATH_VAR)
        .map(PathBuf::from)
        .map_err(|_| LifecycleError::NoPidFilepath)
}

pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/lrs/lrs.toml"))
}

/// Short hostname used to scope DSS locks (`spec.md` §3 Lock, §4.4). The
/// kernel `gethostname(2)` call requires `unsafe`, forbidden workspace-wide,
/// so this reads `HOSTNAME` from the environment, falling back to the
/// `/proc/sys/kernel/hostname` file Linux always provides.
pub fn hostname() -> String {
    if let Ok(h) = std::env::var("HOSTNAME") {
        if !h.is_empty() {
            return h;
        }
    }
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "localhost".to_string())
}
