// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML configuration (`spec.md` §6 "Environment / config"). Loaded once at
//! startup via [`Config::load`], mirroring `oj-daemon::lifecycle::Config`'s
//! typed-struct-plus-associated-loader pattern rather than the flat
//! `key=value` merge `oj-engine::env` uses elsewhere in the teacher
//! workspace — `spec.md`'s config keys are nested (`io_sched/<family>/...`)
//! and TOML tables express that directly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use lrs_engine::dispatch::fair_share::{FairShareLimits, TechLimits};
use serde::Deserialize;

use super::LifecycleError;

#[derive(Debug, Clone, Deserialize)]
pub struct LrsSection {
    pub lock_file: PathBuf,
    pub mount_prefix: String,
    pub families: Vec<String>,
    /// Where `lrs-dss::FileDss` persists device/media/lock rows. Not named
    /// in `spec.md` §6's config table (the DSS itself is out of scope); added
    /// here since the working `FileDss` implementation needs a path.
    pub dss_path: PathBuf,
    #[serde(default)]
    pub listen_socket_path: Option<String>,
    #[serde(default)]
    pub listen_tcp_host: Option<String>,
    #[serde(default)]
    pub listen_tcp_port: Option<u16>,
    #[serde(default = "default_max_dispatch_delay_ms")]
    pub max_dispatch_delay_ms: u64,
    /// Not in `spec.md` §6's table either; added alongside `dss_path` so
    /// `-i` (interactive, stderr-only) and daemonized starts can both be
    /// configured from the same file.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

fn default_max_dispatch_delay_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct IoSchedSection {
    pub dispatch_algo: String,
    #[serde(default)]
    pub read_algo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScsiSection {
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_short_ms")]
    pub retry_short_ms: u64,
    #[serde(default = "default_retry_long_ms")]
    pub retry_long_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub query_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub move_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub inquiry_timeout_ms: u64,
    #[serde(default = "default_max_element_status")]
    pub max_element_status: u32,
}

fn default_retry_count() -> u32 {
    3
}
fn default_retry_short_ms() -> u64 {
    1_000
}
fn default_retry_long_ms() -> u64 {
    5_000
}
fn default_timeout_ms() -> u64 {
    5_000
}
fn default_max_element_status() -> u32 {
    1_024
}

impl Default for ScsiSection {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_short_ms: default_retry_short_ms(),
            retry_long_ms: default_retry_long_ms(),
            query_timeout_ms: default_timeout_ms(),
            move_timeout_ms: default_timeout_ms(),
            inquiry_timeout_ms: default_timeout_ms(),
            max_element_status: default_max_element_status(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncSection {
    #[serde(default = "default_sync_time_ms")]
    pub sync_time_ms: u64,
    #[serde(default = "default_sync_nb_req")]
    pub sync_nb_req: usize,
    #[serde(default = "default_sync_wsize_kb")]
    pub sync_wsize_kb: u64,
}

fn default_sync_time_ms() -> u64 {
    5_000
}
fn default_sync_nb_req() -> usize {
    16
}
fn default_sync_wsize_kb() -> u64 {
    102_400
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            sync_time_ms: default_sync_time_ms(),
            sync_nb_req: default_sync_nb_req(),
            sync_wsize_kb: default_sync_wsize_kb(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LtfsSection {
    #[serde(default)]
    pub cmd_mount: Option<String>,
    #[serde(default)]
    pub cmd_umount: Option<String>,
    #[serde(default)]
    pub cmd_mkltfs: Option<String>,
    #[serde(default)]
    pub cmd_sync: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TlcSection {
    #[serde(default = "default_tlc_hostname")]
    pub hostname: String,
    #[serde(default = "default_tlc_port")]
    pub port: u16,
}

fn default_tlc_hostname() -> String {
    "localhost".to_string()
}
fn default_tlc_port() -> u16 {
    20_123
}

impl Default for TlcSection {
    fn default() -> Self {
        Self {
            hostname: default_tlc_hostname(),
            port: default_tlc_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TapeModelSection {
    #[serde(default)]
    pub supported_list: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DriveTypeSection {
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct TechLimitsSection {
    #[serde(default)]
    pub min_format: u32,
    #[serde(default)]
    pub min_write: u32,
    #[serde(default)]
    pub min_read: u32,
    #[serde(default)]
    pub max_format: u32,
    #[serde(default)]
    pub max_write: u32,
    #[serde(default)]
    pub max_read: u32,
}

impl From<TechLimitsSection> for TechLimits {
    fn from(s: TechLimitsSection) -> Self {
        TechLimits {
            min_format: s.min_format,
            min_write: s.min_write,
            min_read: s.min_read,
            max_format: s.max_format,
            max_write: s.max_write,
            max_read: s.max_read,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub lrs: LrsSection,
    #[serde(default)]
    pub io_sched: HashMap<String, IoSchedSection>,
    #[serde(default)]
    pub scsi: ScsiSection,
    #[serde(default)]
    pub sync: HashMap<String, SyncSection>,
    #[serde(default)]
    pub ltfs: LtfsSection,
    #[serde(default)]
    pub tlc: TlcSection,
    #[serde(default)]
    pub tape_model: TapeModelSection,
    #[serde(default)]
    pub drive_type: HashMap<String, DriveTypeSection>,
    /// `[fair_share.<family>.<technology>]` — not itself a named key in
    /// `spec.md` §6 (the table only says "model→technology mapping used by
    /// fair-share"), but `fair_share`'s min/max table has to live somewhere;
    /// this is its home.
    #[serde(default)]
    pub fair_share: HashMap<String, HashMap<String, TechLimitsSection>>,
}

impl Config {
    pub fn load(path: &std::path::Path) -> Result<Self, LifecycleError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LifecycleError::Config(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&text)
            .map_err(|e| LifecycleError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn families(&self) -> Result<Vec<lrs_core::Family>, LifecycleError> {
        self.lrs
            .families
            .iter()
            .map(|f| {
                f.parse()
                    .map_err(|_| LifecycleError::Config(format!("unknown family '{f}'")))
            })
            .collect()
    }

    pub fn retry_policy(&self) -> lrs_engine::RetryPolicy {
        lrs_engine::RetryPolicy {
            retry_count: self.scsi.retry_count,
            retry_short: Duration::from_millis(self.scsi.retry_short_ms),
            retry_long: Duration::from_millis(self.scsi.retry_long_ms),
        }
    }

    pub fn sync_thresholds(&self, family: lrs_core::Family) -> lrs_engine::SyncThresholds {
        let section = self
            .sync
            .get(family.as_str())
            .cloned()
            .unwrap_or_default();
        lrs_engine::SyncThresholds {
            sync_time: Duration::from_millis(section.sync_time_ms),
            sync_nb_req: section.sync_nb_req,
            sync_wsize_bytes: section.sync_wsize_kb * 1024,
        }
    }

    pub fn max_dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.lrs.max_dispatch_delay_ms)
    }

    /// `spec.md` §9 ambiguity (3): the model→technology mapping is
    /// case-sensitive. Looks `model` up in every `[drive_type.*]` table's
    /// `models` list; the table key (minus a trailing `_drive`) is the
    /// technology name (e.g. `lto5_drive` → `LTO5`, uppercased to match the
    /// glossary's convention for technology strings).
    pub fn resolve_technology(&self, model: &str) -> Option<String> {
        self.drive_type.iter().find_map(|(key, section)| {
            if section.models.iter().any(|m| m == model) {
                Some(
                    key.strip_suffix("_drive")
                        .unwrap_or(key)
                        .to_uppercase(),
                )
            } else {
                None
            }
        })
    }

    /// Builds the dispatcher for one family's `io_sched/<family>/dispatch_algo`
    /// key. `fair_share` additionally pulls its per-technology min/max table
    /// from `[fair_share.<family>]`; `fifo`/`grouped_read` resolve through
    /// `lrs_engine::dispatch::by_name`.
    pub fn dispatcher_for(
        &self,
        family: lrs_core::Family,
    ) -> Result<Box<dyn lrs_engine::Dispatcher>, LifecycleError> {
        let algo = self
            .io_sched
            .get(family.as_str())
            .map(|s| s.dispatch_algo.as_str())
            .unwrap_or("fifo");
        if algo == "fair_share" {
            let per_technology = self
                .fair_share
                .get(family.as_str())
                .map(|table| {
                    table
                        .iter()
                        .map(|(tech, limits)| (tech.clone(), TechLimits::from(*limits)))
                        .collect()
                })
                .unwrap_or_default();
            return Ok(Box::new(
                lrs_engine::dispatch::fair_share::FairShareDispatcher::new(FairShareLimits {
                    per_technology,
                }),
            ));
        }
        lrs_engine::by_name(algo)
            .ok_or_else(|| LifecycleError::Config(format!("unknown dispatch_algo '{algo}'")))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
