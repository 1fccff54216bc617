//! Process-image replacement.

use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::BootError;

/// Replace this process with `target`, argv = `[target]`, environment
/// inherited. Only returns on failure.
pub fn exec(target: &Path) -> BootError {
    info!(target = %target.display(), "executing");
    let source = Command::new(target).exec();
    BootError::Exec { path: target.to_path_buf(), source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_exec_returns_error_with_path() {
        let err = exec(Path::new("/nonexistent/bin/bpfloader"));
        match &err {
            BootError::Exec { path, source } => {
                assert_eq!(path, Path::new("/nonexistent/bin/bpfloader"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.exit_code(), 1);
    }
}
