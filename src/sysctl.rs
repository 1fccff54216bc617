//! Sysctl tuner — fixed values into proc-sys control files.
//!
//! A knob's existence is itself kernel-version dependent, so a failed
//! write is tolerated below the knob's `fatal_from` version and fatal at or
//! above it.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use tracing::{error, info, warn};

use crate::error::BootError;
use crate::kernel::probe::api;
use crate::kernel::{KernelVersion, SystemFacts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Knob {
    /// Relative to the proc-sys root.
    pub path: &'static str,
    pub value: &'static str,
    pub fatal_from: KernelVersion,
}

pub const KNOBS: &[Knob] = &[
    // 5.16 changed the default to 2 (disabled but changeable); we need 0.
    // Known to be missing on some 4.19 kernels, where it defaults to 0 anyway.
    Knob {
        path: "kernel/unprivileged_bpf_disabled",
        value: "0\n",
        fatal_from: KernelVersion::new(5, 13, 0),
    },
    // Absent without CONFIG_BPF_JIT.
    Knob {
        path: "net/core/bpf_jit_enable",
        value: "1\n",
        fatal_from: KernelVersion::new(4, 14, 0),
    },
    // JIT symbol export for privileged users only; absent without CONFIG_HAVE_EBPF_JIT.
    Knob {
        path: "net/core/bpf_jit_kallsyms",
        value: "1\n",
        fatal_from: KernelVersion::new(4, 14, 0),
    },
];

/// Write `value` into an existing control file. The file is never created
/// or truncated, and a short write is an error.
pub fn write_proc_sys_file(path: &Path, value: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    let written = file.write(value.as_bytes())?;
    if written != value.len() {
        return Err(io::Error::from_raw_os_error(libc::EINVAL));
    }
    Ok(())
}

/// Apply one knob, tolerating failure on kernels older than `fatal_from`.
pub fn apply_knob(proc_sys: &Path, knob: &Knob, kernel: KernelVersion) -> Result<(), BootError> {
    let path = proc_sys.join(knob.path);
    match write_proc_sys_file(&path, knob.value) {
        Ok(()) => {
            info!(path = %path.display(), value = knob.value.trim_end(), "sysctl set");
            Ok(())
        }
        Err(e) if !kernel.is_at_least(knob.fatal_from) => {
            warn!(
                path = %path.display(),
                error = %e,
                %kernel,
                "sysctl write failed, tolerated on this kernel"
            );
            Ok(())
        }
        Err(e) => {
            error!(
                path = %path.display(),
                value = knob.value.trim_end(),
                error = %e,
                "sysctl write failed"
            );
            Err(BootError::Sysctl { path, source: e })
        }
    }
}

/// Apply every knob in order. Only devices at API level U or later are tuned.
pub fn apply(proc_sys: &Path, facts: &SystemFacts) -> Result<(), BootError> {
    if !facts.is_at_least_api(api::U) {
        return Ok(());
    }
    for knob in KNOBS {
        apply_knob(proc_sys, knob, facts.kernel)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::BuildType;
    use std::fs;
    use tempfile::TempDir;

    fn facts(api_level: u32, kernel: KernelVersion) -> SystemFacts {
        SystemFacts {
            kernel,
            is_x86: false,
            is_kernel_64bit: true,
            is_userspace_32bit: false,
            api_level,
            build_type: BuildType::User,
        }
    }

    fn create_knobs(root: &Path) {
        for knob in KNOBS {
            let path = root.join(knob.path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
    }

    #[test]
    fn writes_newline_terminated_values() {
        let tmp = TempDir::new().unwrap();
        create_knobs(tmp.path());
        apply(tmp.path(), &facts(api::U, KernelVersion::new(5, 15, 0))).unwrap();
        for knob in KNOBS {
            assert_eq!(fs::read_to_string(tmp.path().join(knob.path)).unwrap(), knob.value);
        }
    }

    #[test]
    fn missing_knob_tolerated_below_minimum() {
        let tmp = TempDir::new().unwrap();
        let knob = &KNOBS[0];
        assert!(apply_knob(tmp.path(), knob, KernelVersion::new(5, 12, 99)).is_ok());
        assert!(!tmp.path().join(knob.path).exists(), "knob file must not be created");
    }

    #[test]
    fn missing_knob_fatal_at_minimum() {
        let tmp = TempDir::new().unwrap();
        let knob = &KNOBS[0];
        let err = apply_knob(tmp.path(), knob, knob.fatal_from).unwrap_err();
        match err {
            BootError::Sysctl { path, source } => {
                assert!(path.ends_with(knob.path));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pre_u_devices_are_not_tuned() {
        let tmp = TempDir::new().unwrap();
        // No knob files exist and the kernel is new: would be fatal if tuned.
        assert!(apply(tmp.path(), &facts(api::T, KernelVersion::new(6, 1, 0))).is_ok());
    }

    #[test]
    fn first_fatal_knob_stops_the_sweep() {
        let tmp = TempDir::new().unwrap();
        create_knobs(tmp.path());
        fs::remove_file(tmp.path().join(KNOBS[1].path)).unwrap();
        let err = apply(tmp.path(), &facts(api::V, KernelVersion::new(6, 1, 0))).unwrap_err();
        assert!(matches!(err, BootError::Sysctl { .. }));
        assert_eq!(fs::read_to_string(tmp.path().join(KNOBS[2].path)).unwrap(), "");
    }
}
