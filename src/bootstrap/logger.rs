//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after the config is resolved. At this
//! point in boot no log daemon exists, so output normally goes to the
//! kernel log device.

use std::path::Path;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::error::BootError;

/// Initialise the global tracing subscriber.
///
/// `level` accepts standard level strings: `"error"`, `"warn"`, `"info"`,
/// `"debug"`, `"trace"`.
///
/// If `prefer_level` is `true`, `level` takes precedence and `RUST_LOG` is only
/// used as a fallback when `level` is invalid. If `prefer_level` is `false`,
/// `RUST_LOG` takes precedence and `level` is the fallback.
///
/// With `log_file`, output is appended there (without ANSI colours);
/// otherwise it goes to stderr.
pub fn init(level: &str, prefer_level: bool, log_file: Option<&Path>) -> Result<(), BootError> {
    let filter = if prefer_level {
        match EnvFilter::try_new(level) {
            Ok(filter) => filter,
            Err(level_err) => EnvFilter::try_from_default_env().map_err(|env_err| {
                BootError::Logger(format!(
                    "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
                ))
            })?,
        }
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| BootError::Logger(format!("invalid log level '{level}': {e}")))?
    };

    let writer = if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| {
                BootError::Logger(format!("failed to open log file '{}': {e}", path.display()))
            })?;
        BoxMakeWriter::new(file)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_file.is_none())
        .without_time()
        .try_init()
        .map_err(|e| BootError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_log_file_is_reported() {
        let err = init("info", true, Some(Path::new("/nonexistent/dir/kmsg"))).unwrap_err();
        assert!(err.to_string().contains("failed to open log file"));
    }

    #[test]
    fn init_info_succeeds_or_already_init() {
        // May already be set by a prior test in the same process.
        match init("info", false, None) {
            Ok(()) => {}
            Err(BootError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
