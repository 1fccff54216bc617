//! Object sources and where their artifacts get pinned.

use std::path::{Path, PathBuf};

/// Pin directory not tied to any object source. Nothing is loaded from
/// it; it only exists so filesystem-policy rules keyed on it apply.
pub const RESERVED_PIN_DIR: &str = "loader";

/// One source directory of object files and its pin sub-path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub dir: PathBuf,
    /// Sub-path under the pinned-object mount point, e.g. `"tethering/"`.
    pub prefix: String,
}

// (directory under the module mount point, pin prefix), in load order.
const TABLE: &[(&str, &str)] = &[
    // tether offload, network stack only
    ("etc/bpf/", "tethering/"),
    // shared with netd and system server; iptables xt_bpf helper can read it
    ("etc/bpf/netd_shared/", "netd_shared/"),
    // shared with netd (read only) and system server
    ("etc/bpf/netd_readonly/", "netd_readonly/"),
    // shared with system server
    ("etc/bpf/net_shared/", "net_shared/"),
    // network stack only
    ("etc/bpf/net_private/", "net_private/"),
];

/// The ordered location table rooted at `module_mount`.
pub fn default_locations(module_mount: &Path) -> Vec<Location> {
    TABLE
        .iter()
        .map(|(dir, prefix)| Location {
            dir: module_mount.join(dir),
            prefix: (*prefix).to_string(),
        })
        .collect()
}
