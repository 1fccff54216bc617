//! Raw TOML shape — `serde` target before resolution.
//!
//! Every key is optional; anything missing falls back to the production
//! layout. `[paths] root` relocates the whole default layout under a
//! directory, which is how tests and image-staging runs use it.

use serde::Deserialize;

pub(super) const DEFAULT_PLATFORM_ENTRY: &str = "/system/bin/netbpfload";
pub(super) const DEFAULT_SECOND_STAGE: &str = "/system/bin/bpfloader";
pub(super) const DEFAULT_LEGACY_INIT_RC: &str = "/system/etc/init/bpfloader.rc";
pub(super) const DEFAULT_NEW_INIT_RC: &str = "/system/etc/init/netbpfload.rc";
pub(super) const DEFAULT_MODULE_MOUNT: &str = "/apex/com.android.tethering";
pub(super) const MODULE_ENTRY_IN_MOUNT: &str = "bin/netbpfload";
pub(super) const DEFAULT_MOUNTS_TABLE: &str = "/proc/mounts";
pub(super) const DEFAULT_PIN_ROOT: &str = "/sys/fs/bpf";
pub(super) const DEFAULT_PROC_SYS: &str = "/proc/sys";
pub(super) const DEFAULT_BUILD_PROPS: &str = "/system/build.prop";

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub paths: RawPaths,
    #[serde(default)]
    pub loader: RawLoader,
    #[serde(default)]
    pub log: RawLog,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawPaths {
    pub root: Option<String>,
    pub platform_entry: Option<String>,
    pub module_entry: Option<String>,
    pub second_stage: Option<String>,
    /// Defaults to `second_stage`: the legacy loader and the second stage
    /// are the same binary on current images.
    pub legacy_loader: Option<String>,
    pub legacy_init_rc: Option<String>,
    pub new_init_rc: Option<String>,
    pub module_mount: Option<String>,
    pub mounts_table: Option<String>,
    pub pin_root: Option<String>,
    pub proc_sys: Option<String>,
    pub build_props: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawLoader {
    #[serde(default)]
    pub helper: Option<String>,
    #[serde(default = "default_critical_stall_secs")]
    pub critical_stall_secs: u64,
}

impl Default for RawLoader {
    fn default() -> Self {
        Self { helper: None, critical_stall_secs: default_critical_stall_secs() }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawLog {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Empty string means stderr.
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for RawLog {
    fn default() -> Self {
        Self { level: default_log_level(), file: default_log_file() }
    }
}

pub(super) fn default_critical_stall_secs() -> u64 {
    20
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_log_file() -> String {
    "/dev/kmsg".to_string()
}
