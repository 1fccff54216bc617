//! Configuration loading with env-var overrides.
//!
//! Reads an optional TOML file, fills every missing key from the production
//! layout, and applies the `NETBPFLOAD_LOG_LEVEL` env override.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::BootError;
use crate::location;

use super::raw::{self, RawConfig};
use super::types::*;

/// Env var naming a config file when `-f/--config` is not given.
pub const CONFIG_ENV: &str = "NETBPFLOAD_CONFIG";
/// Env var overriding the configured log level.
pub const LOG_LEVEL_ENV: &str = "NETBPFLOAD_LOG_LEVEL";

/// Load config from the given path, or from `$NETBPFLOAD_CONFIG`, then apply
/// env-var overrides. With neither, the hard-coded production layout is used.
pub fn load(config_path: Option<&str>) -> Result<Config, BootError> {
    let env_path = env::var(CONFIG_ENV).ok();
    let log_level_override = env::var(LOG_LEVEL_ENV).ok();
    match config_path.or(env_path.as_deref()) {
        Some(path) => load_from(Path::new(path), log_level_override.as_deref()),
        None => Ok(resolve(RawConfig::default(), log_level_override.as_deref())),
    }
}

/// Internal loader — accepts an explicit path and optional override.
/// Tests pass the override directly instead of mutating env vars.
pub fn load_from(path: &Path, log_level_override: Option<&str>) -> Result<Config, BootError> {
    let text = fs::read_to_string(path)
        .map_err(|e| BootError::Config(format!("cannot read {}: {e}", path.display())))?;
    let parsed: RawConfig = toml::from_str(&text)
        .map_err(|e| BootError::Config(format!("parse error in {}: {e}", path.display())))?;
    Ok(resolve(parsed, log_level_override))
}

impl Config {
    /// Production layout relocated under `root`.
    pub fn rooted_at(root: &Path) -> Self {
        let mut parsed = RawConfig::default();
        parsed.paths.root = Some(root.to_string_lossy().into_owned());
        resolve(parsed, None)
    }
}

fn resolve(parsed: RawConfig, log_level_override: Option<&str>) -> Config {
    let p = parsed.paths;
    let root = p.root.map(PathBuf::from);
    let place = |explicit: Option<String>, default: &str| match explicit {
        Some(path) => PathBuf::from(path),
        None => reroot(root.as_deref(), Path::new(default)),
    };

    let module_mount = place(p.module_mount, raw::DEFAULT_MODULE_MOUNT);
    let module_entry = p
        .module_entry
        .map(PathBuf::from)
        .unwrap_or_else(|| module_mount.join(raw::MODULE_ENTRY_IN_MOUNT));
    let second_stage = place(p.second_stage, raw::DEFAULT_SECOND_STAGE);
    let legacy_loader = p
        .legacy_loader
        .map(PathBuf::from)
        .unwrap_or_else(|| second_stage.clone());

    let paths = Paths {
        platform_entry: place(p.platform_entry, raw::DEFAULT_PLATFORM_ENTRY),
        module_entry,
        second_stage,
        legacy_loader,
        legacy_init_rc: place(p.legacy_init_rc, raw::DEFAULT_LEGACY_INIT_RC),
        new_init_rc: place(p.new_init_rc, raw::DEFAULT_NEW_INIT_RC),
        mounts_table: place(p.mounts_table, raw::DEFAULT_MOUNTS_TABLE),
        pin_root: place(p.pin_root, raw::DEFAULT_PIN_ROOT),
        proc_sys: place(p.proc_sys, raw::DEFAULT_PROC_SYS),
        build_props: place(p.build_props, raw::DEFAULT_BUILD_PROPS),
        module_mount,
    };

    let locations = location::default_locations(&paths.module_mount);

    Config {
        paths,
        loader: LoaderConfig {
            helper: parsed.loader.helper.map(PathBuf::from),
            critical_stall: Duration::from_secs(parsed.loader.critical_stall_secs),
        },
        log: LogConfig {
            level: log_level_override.unwrap_or(&parsed.log.level).to_string(),
            file: Some(parsed.log.file).filter(|f| !f.is_empty()).map(PathBuf::from),
        },
        locations,
    }
}

/// Place an absolute default path under `root`, if one is set.
fn reroot(root: Option<&Path>, path: &Path) -> PathBuf {
    match root {
        Some(root) => root.join(path.strip_prefix("/").unwrap_or(path)),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn empty_file_yields_production_layout() {
        let f = write_toml("");
        let cfg = load_from(f.path(), None).unwrap();
        assert_eq!(cfg.paths.platform_entry, PathBuf::from("/system/bin/netbpfload"));
        assert_eq!(
            cfg.paths.module_entry,
            PathBuf::from("/apex/com.android.tethering/bin/netbpfload")
        );
        assert_eq!(cfg.paths.second_stage, PathBuf::from("/system/bin/bpfloader"));
        assert_eq!(cfg.paths.legacy_loader, cfg.paths.second_stage);
        assert_eq!(cfg.paths.pin_root, PathBuf::from("/sys/fs/bpf"));
        assert_eq!(cfg.loader.critical_stall, Duration::from_secs(20));
        assert_eq!(cfg.loader.helper, None);
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.log.file, Some(PathBuf::from("/dev/kmsg")));
        assert_eq!(cfg.locations.len(), 5);
    }

    #[test]
    fn root_relocates_defaults_but_not_explicit_paths() {
        let f = write_toml(
            r#"
[paths]
root = "/tmp/stage"
second_stage = "/opt/bpfloader"
"#,
        );
        let cfg = load_from(f.path(), None).unwrap();
        assert_eq!(cfg.paths.pin_root, PathBuf::from("/tmp/stage/sys/fs/bpf"));
        assert_eq!(
            cfg.paths.module_entry,
            PathBuf::from("/tmp/stage/apex/com.android.tethering/bin/netbpfload")
        );
        assert_eq!(cfg.paths.second_stage, PathBuf::from("/opt/bpfloader"));
        assert!(cfg.locations[0].dir.starts_with("/tmp/stage/apex/com.android.tethering"));
    }

    #[test]
    fn loader_and_log_sections_parse() {
        let f = write_toml(
            r#"
[loader]
helper = "/system/bin/bpfobjload"
critical_stall_secs = 3

[log]
level = "debug"
file = ""
"#,
        );
        let cfg = load_from(f.path(), None).unwrap();
        assert_eq!(cfg.loader.helper, Some(PathBuf::from("/system/bin/bpfobjload")));
        assert_eq!(cfg.loader.critical_stall, Duration::from_secs(3));
        assert_eq!(cfg.log.level, "debug");
        assert_eq!(cfg.log.file, None);
    }

    #[test]
    fn log_level_override_wins() {
        let f = write_toml("[log]\nlevel = \"warn\"\n");
        let cfg = load_from(f.path(), Some("trace")).unwrap();
        assert_eq!(cfg.log.level, "trace");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let f = write_toml("[paths]\npin_rot = \"/x\"\n");
        let err = load_from(f.path(), None).unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn missing_file_errors() {
        let err = load_from(Path::new("/nonexistent/netbpfload.toml"), None).unwrap_err();
        assert!(err.to_string().contains("config error"));
    }

    #[test]
    fn rooted_at_matches_root_key() {
        let cfg = Config::rooted_at(Path::new("/stage"));
        assert_eq!(cfg.paths.proc_sys, PathBuf::from("/stage/proc/sys"));
        assert_eq!(cfg.paths.new_init_rc, PathBuf::from("/stage/system/etc/init/netbpfload.rc"));
    }
}
