//! Module version discovery from the mounts table.
//!
//! The module is mounted twice from the same block device: once at its
//! plain mount point and once at `<mount point>@<version>`.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

/// `(block device, mount path)` of each well-formed mounts-table line.
fn entries(table: &str) -> impl Iterator<Item = (&str, &str)> {
    table.lines().filter_map(|line| {
        let mut fields = line.split(' ');
        Some((fields.next()?, fields.next()?))
    })
}

/// Versions the module at `mount_point` is mounted under.
pub fn module_versions(table: &str, mount_point: &str) -> Vec<String> {
    let Some(blockdev) = entries(table)
        .find(|(_, path)| *path == mount_point)
        .map(|(dev, _)| dev)
    else {
        return Vec::new();
    };
    debug!(%blockdev, mount_point, "module mounted from block device");

    let versioned = format!("{mount_point}@");
    entries(table)
        .filter(|(dev, _)| *dev == blockdev)
        .filter_map(|(_, path)| path.strip_prefix(&versioned))
        .map(str::to_string)
        .collect()
}

/// Log the module version(s); never fails the boot.
pub fn log_module_version(table_path: &Path, mount_point: &Path) {
    let table = match fs::read_to_string(table_path) {
        Ok(t) => t,
        Err(e) => {
            debug!(path = %table_path.display(), error = %e, "cannot read mounts table");
            return;
        }
    };
    let versions = module_versions(&table, &mount_point.to_string_lossy());
    if versions.is_empty() {
        debug!(mount_point = %mount_point.display(), "module version not found");
    }
    for version in versions {
        info!(%version, "Tethering APEX version");
    }
}
