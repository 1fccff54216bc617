//! Stage sequencing.
//!
//! ```text
//! resolve variant ─► capability gate ─► sysctl ─► pin dirs ─► load sweep ─► sanity ─► handoff
//! ```
//!
//! Every stage completes before the next starts. [`Pipeline::run`] never
//! execs or exits itself: it returns an [`Outcome`] and `main` performs it,
//! so the whole sequence runs under test with fake collaborators.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info};

use crate::config::{Config, Target};
use crate::error::BootError;
use crate::gate;
use crate::kernel::SystemFacts;
use crate::kernel::bpf::MapOps;
use crate::loader::{self, ObjectLoader};
use crate::mounts;
use crate::pin;
use crate::sanity;
use crate::sysctl;
use crate::variant::{self, BootVariant, Decision, InitScriptPresence};

/// What the process must do once the pipeline returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Replace the process image with this executable.
    Exec(PathBuf),
    /// Exit with this code.
    Exit(i32),
}

pub struct Pipeline<'a> {
    config: &'a Config,
    facts: &'a SystemFacts,
    loader: &'a dyn ObjectLoader,
    maps: &'a dyn MapOps,
    stall: &'a dyn Fn(Duration),
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        facts: &'a SystemFacts,
        loader: &'a dyn ObjectLoader,
        maps: &'a dyn MapOps,
        stall: &'a dyn Fn(Duration),
    ) -> Self {
        Self { config, facts, loader, maps, stall }
    }

    pub fn run(&self, argv0: &str) -> Outcome {
        match self.try_run(argv0) {
            Ok(target) => Outcome::Exec(self.config.paths.target(target).to_path_buf()),
            Err(e) => {
                error!(error = %e, errno = ?e.errno(), "netbpfload failed");
                Outcome::Exit(e.exit_code())
            }
        }
    }

    fn try_run(&self, argv0: &str) -> Result<Target, BootError> {
        let paths = &self.config.paths;
        let facts = self.facts;

        let variant = BootVariant::from_argv0(argv0, paths);
        let scripts = InitScriptPresence::probe(paths)?;

        let platform = variant == BootVariant::Platform;
        let mainline = variant == BootVariant::MainlineModule;
        let kver = format!("{:07x}", facts.kernel.code());
        let rc = format!("{}{}", u8::from(scripts.legacy), u8::from(scripts.new));
        info!(
            argv0,
            api = facts.api_level,
            %kver,
            platform,
            mainline,
            %rc,
            "NetBpfLoad starting"
        );

        match variant::resolve(variant, argv0, scripts) {
            Decision::Fatal(e) => return Err(e),
            Decision::Delegate(Target::ModuleEntry) => {
                info!("Executing apex netbpfload...");
                return Ok(Target::ModuleEntry);
            }
            Decision::Delegate(target) => {
                mounts::log_module_version(&paths.mounts_table, &paths.module_mount);
                info!("pre two-stage platform, handing over to legacy bpfloader");
                return Ok(target);
            }
            Decision::Proceed => {
                mounts::log_module_version(&paths.mounts_table, &paths.module_mount);
            }
        }

        gate::check(facts)?;
        sysctl::apply(&paths.proc_sys, facts)?;

        // Pinning and selinux relabeling inside these fail with ENOENT if
        // the directories do not exist yet.
        pin::create_all(&paths.pin_root, &self.config.locations)?;

        loader::load_all(
            self.loader,
            &self.config.locations,
            self.stall,
            self.config.loader.critical_stall,
        )?;

        sanity::check(self.maps)?;

        info!("done, transferring control to platform bpfloader.");
        Ok(Target::SecondStage)
    }
}
