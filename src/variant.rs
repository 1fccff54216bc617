//! Boot-variant resolution — which copy is running and where control goes.
//!
//! The decision itself ([`resolve`]) is pure; the pipeline turns a
//! [`Decision::Delegate`] into an exec and a [`Decision::Fatal`] into an
//! exit code.

use std::io;
use std::path::Path;

use tracing::info;

use crate::config::{Paths, Target};
use crate::error::BootError;

/// Which copy of the executable this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootVariant {
    Platform,
    MainlineModule,
    Unknown,
}

impl BootVariant {
    /// Exact comparison of `argv0` against the two known entry paths.
    pub fn from_argv0(argv0: &str, paths: &Paths) -> Self {
        let argv0 = Path::new(argv0);
        if argv0 == paths.platform_entry {
            BootVariant::Platform
        } else if argv0 == paths.module_entry {
            BootVariant::MainlineModule
        } else {
            BootVariant::Unknown
        }
    }
}

/// Which of the two platform init scripts the image ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitScriptPresence {
    /// Single-stage layout (`bpfloader.rc`).
    pub legacy: bool,
    /// Two-stage layout (`netbpfload.rc`).
    pub new: bool,
}

impl InitScriptPresence {
    pub fn probe(paths: &Paths) -> Result<Self, BootError> {
        Ok(Self {
            legacy: exists(&paths.legacy_init_rc)?,
            new: exists(&paths.new_init_rc)?,
        })
    }
}

/// Presence check that follows symlinks, so a dangling link is absent.
/// Only "not found" means absent; anything else (typically a policy
/// denial) means the image cannot be trusted.
pub fn exists(path: &Path) -> Result<bool, BootError> {
    match std::fs::metadata(path) {
        Ok(_) => {
            info!(path = %path.display(), "exists");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BootError::Probe(format!("access({}) failed: {e}", path.display()))),
    }
}

/// What to do after variant resolution.
#[derive(Debug)]
pub enum Decision {
    /// Run the remaining stages in this process.
    Proceed,
    /// Replace this process with another executable.
    Delegate(Target),
    Fatal(BootError),
}

/// Pure decision table over the variant and init layout.
///
/// The platform copy always hands over to the module copy; the init layout
/// only matters once the module copy is running.
pub fn resolve(variant: BootVariant, argv0: &str, scripts: InitScriptPresence) -> Decision {
    match variant {
        BootVariant::Unknown => Decision::Fatal(BootError::UnknownVariant(argv0.to_string())),
        BootVariant::Platform => Decision::Delegate(Target::ModuleEntry),
        BootVariant::MainlineModule => match (scripts.legacy, scripts.new) {
            (false, false) => Decision::Fatal(BootError::InitLayout(
                "unable to find platform's bpfloader & netbpfload init scripts".into(),
            )),
            (true, true) => Decision::Fatal(BootError::InitLayout(
                "platform has *both* bpfloader & netbpfload init scripts".into(),
            )),
            (true, false) => Decision::Delegate(Target::LegacyLoader),
            (false, true) => Decision::Proceed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn paths() -> Paths {
        Config::rooted_at(Path::new("/")).paths
    }

    #[test]
    fn argv0_matches_exact_paths_only() {
        let p = paths();
        assert_eq!(
            BootVariant::from_argv0("/system/bin/netbpfload", &p),
            BootVariant::Platform
        );
        assert_eq!(
            BootVariant::from_argv0("/apex/com.android.tethering/bin/netbpfload", &p),
            BootVariant::MainlineModule
        );
        assert_eq!(BootVariant::from_argv0("netbpfload", &p), BootVariant::Unknown);
        assert_eq!(
            BootVariant::from_argv0("/system/bin/netbpfload2", &p),
            BootVariant::Unknown
        );
    }

    #[test]
    fn decision_table_is_total() {
        let variants = [BootVariant::Platform, BootVariant::MainlineModule, BootVariant::Unknown];
        for variant in variants {
            for legacy in [false, true] {
                for new in [false, true] {
                    let d = resolve(variant, "argv0", InitScriptPresence { legacy, new });
                    let ok = match (variant, legacy, new) {
                        (BootVariant::Unknown, ..) => {
                            matches!(d, Decision::Fatal(BootError::UnknownVariant(_)))
                        }
                        (BootVariant::Platform, ..) => {
                            matches!(d, Decision::Delegate(Target::ModuleEntry))
                        }
                        (_, true, true) | (_, false, false) => {
                            matches!(d, Decision::Fatal(BootError::InitLayout(_)))
                        }
                        (_, true, false) => matches!(d, Decision::Delegate(Target::LegacyLoader)),
                        (_, false, true) => matches!(d, Decision::Proceed),
                    };
                    assert!(ok, "{variant:?} legacy={legacy} new={new} -> {d:?}");
                }
            }
        }
    }

    #[test]
    fn presence_reads_marker_files() {
        let tmp = TempDir::new().unwrap();
        let p = Config::rooted_at(tmp.path()).paths;
        assert_eq!(InitScriptPresence::probe(&p).unwrap(), InitScriptPresence::default());

        fs::create_dir_all(p.new_init_rc.parent().unwrap()).unwrap();
        fs::write(&p.new_init_rc, "service netbpfload\n").unwrap();
        assert_eq!(
            InitScriptPresence::probe(&p).unwrap(),
            InitScriptPresence { legacy: false, new: true }
        );
    }

    #[test]
    fn exists_reports_missing_as_false() {
        let tmp = TempDir::new().unwrap();
        assert!(!exists(&tmp.path().join("nope.rc")).unwrap());
        assert!(exists(tmp.path()).unwrap());
    }

    #[test]
    fn dangling_marker_symlink_is_absent() {
        let tmp = TempDir::new().unwrap();
        let p = Config::rooted_at(tmp.path()).paths;
        fs::create_dir_all(p.legacy_init_rc.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.rc"), &p.legacy_init_rc).unwrap();

        assert!(!exists(&p.legacy_init_rc).unwrap());
        assert_eq!(InitScriptPresence::probe(&p).unwrap(), InitScriptPresence::default());
    }
}
