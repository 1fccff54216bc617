//! Bootstrap-wide error type and its mapping onto process exit codes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code for every fatal condition except a critical object-load failure.
pub const EXIT_FATAL: i32 = 1;
/// Exit code for a critical object-load failure (device unlikely to boot).
pub const EXIT_CRITICAL_LOAD: i32 = 2;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("unable to determine if we're platform or mainline netbpfload (argv0: '{0}')")]
    UnknownVariant(String),

    #[error("init layout error: {0}")]
    InitLayout(String),

    #[error("probe error: {0}")]
    Probe(String),

    #[error("kernel capability gate: {0}")]
    Capability(String),

    #[error("sysctl error: {path}: {source}")]
    Sysctl {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    PinDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("critical failure loading bpf programs from {dir} (errno {errno})")]
    CriticalLoad { dir: PathBuf, errno: i32 },

    #[error("sanity check failed: {0}")]
    Sanity(String),

    #[error("exec '{path}' failed: {source}")]
    Exec {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BootError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            BootError::CriticalLoad { .. } => EXIT_CRITICAL_LOAD,
            _ => EXIT_FATAL,
        }
    }

    /// Negative OS error code carried by I/O-backed failures, if any.
    pub fn errno(&self) -> Option<i32> {
        let source = match self {
            BootError::Sysctl { source, .. }
            | BootError::PinDir { source, .. }
            | BootError::Exec { source, .. } => source,
            BootError::CriticalLoad { errno, .. } => return Some(-errno.abs()),
            _ => return None,
        };
        source.raw_os_error().map(|e| -e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn critical_load_exits_with_two() {
        let e = BootError::CriticalLoad { dir: PathBuf::from("/apex/x/etc/bpf/"), errno: 22 };
        assert_eq!(e.exit_code(), EXIT_CRITICAL_LOAD);
        assert_eq!(e.errno(), Some(-22));
        assert!(e.to_string().contains("/apex/x/etc/bpf/"));
    }

    #[test]
    fn other_failures_exit_with_one() {
        let errors = [
            BootError::UnknownVariant("/bin/sh".into()),
            BootError::InitLayout("both".into()),
            BootError::Capability("too old".into()),
            BootError::Sanity("write".into()),
        ];
        for e in &errors {
            assert_eq!(e.exit_code(), EXIT_FATAL, "{e}");
        }
    }

    #[test]
    fn pin_dir_error_reports_negative_errno() {
        let e = BootError::PinDir {
            path: PathBuf::from("/sys/fs/bpf/tethering/"),
            source: io::Error::from_raw_os_error(libc::EACCES),
        };
        assert_eq!(e.errno(), Some(-libc::EACCES));
        assert!(e.source().is_some());
    }
}
