//! Resolved configuration types consumed by the pipeline stages.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::location::Location;

/// Every filesystem location the bootstrap reads, writes or executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Immutable base-image copy of this executable.
    pub platform_entry: PathBuf,
    /// Updatable mainline-module copy of this executable.
    pub module_entry: PathBuf,
    /// Second-stage loader that receives control after a successful run.
    pub second_stage: PathBuf,
    /// Loader used on images that predate the two-stage split.
    pub legacy_loader: PathBuf,
    /// Init script shipped by images that predate the two-stage split.
    pub legacy_init_rc: PathBuf,
    /// Init script shipped by images with the two-stage split.
    pub new_init_rc: PathBuf,
    /// Mount point of the mainline module.
    pub module_mount: PathBuf,
    /// Mounts table used to discover the module's block device and version.
    pub mounts_table: PathBuf,
    /// Mount point of the pinned-object filesystem.
    pub pin_root: PathBuf,
    /// Root of the proc sysctl tree.
    pub proc_sys: PathBuf,
    /// Build properties file (`key=value` lines).
    pub build_props: PathBuf,
}

/// Which executable a delegation hands control to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    ModuleEntry,
    LegacyLoader,
    SecondStage,
}

impl Paths {
    /// Executable path for a delegation target.
    pub fn target(&self, target: Target) -> &Path {
        match target {
            Target::ModuleEntry => &self.module_entry,
            Target::LegacyLoader => &self.legacy_loader,
            Target::SecondStage => &self.second_stage,
        }
    }
}

/// Object-load driver settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Helper executable that loads and pins a single object file.
    pub helper: Option<PathBuf>,
    /// How long to stall after a critical load failure before exiting.
    pub critical_stall: Duration,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Append log output here instead of stderr (normally the kernel log).
    pub file: Option<PathBuf>,
}

/// Fully-resolved bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub paths: Paths,
    pub loader: LoaderConfig,
    pub log: LogConfig,
    /// Ordered object sources; order is load order.
    pub locations: Vec<Location>,
}
