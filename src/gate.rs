//! Kernel capability gate.
//!
//! Pure predicates over [`SystemFacts`]; the only side effects are log
//! lines and the continue/abort answer.

use tracing::{error, warn};

use crate::error::BootError;
use crate::kernel::probe::api;
use crate::kernel::{KernelVersion, SystemFacts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warn,
    Fail,
}

/// Minimum kernel for devices at or above a platform API level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelRequirement {
    pub api_level: u32,
    pub release: &'static str,
    pub min_kernel: KernelVersion,
    pub severity: Severity,
}

impl KernelRequirement {
    pub fn is_violated_by(&self, facts: &SystemFacts) -> bool {
        facts.is_at_least_api(self.api_level) && !facts.kernel.is_at_least(self.min_kernel)
    }
}

/// Evaluated in order; only the newest threshold is fatal.
pub const KERNEL_REQUIREMENTS: &[KernelRequirement] = &[
    KernelRequirement {
        api_level: api::T,
        release: "T",
        min_kernel: KernelVersion::new(4, 9, 0),
        severity: Severity::Warn,
    },
    KernelRequirement {
        api_level: api::U,
        release: "U",
        min_kernel: KernelVersion::new(4, 14, 0),
        severity: Severity::Warn,
    },
    KernelRequirement {
        api_level: api::V,
        release: "V",
        min_kernel: KernelVersion::new(4, 19, 0),
        severity: Severity::Fail,
    },
];

/// Kernel release from which a 32-bit userspace is refused.
pub const USERSPACE_64BIT_FROM: KernelVersion = KernelVersion::new(6, 2, 0);

/// Requirements violated by `facts`, in table order.
pub fn kernel_violations<'a>(
    table: &'a [KernelRequirement],
    facts: &SystemFacts,
) -> Vec<&'a KernelRequirement> {
    table.iter().filter(|r| r.is_violated_by(facts)).collect()
}

/// Run every gate; the first fatal condition aborts.
pub fn check(facts: &SystemFacts) -> Result<(), BootError> {
    check_against(KERNEL_REQUIREMENTS, facts)
}

pub fn check_against(table: &[KernelRequirement], facts: &SystemFacts) -> Result<(), BootError> {
    for req in kernel_violations(table, facts) {
        let msg = format!("Android {} requires kernel {}.", req.release, req.min_kernel);
        match req.severity {
            Severity::Warn => warn!(kernel = %facts.kernel, "{msg}"),
            Severity::Fail => {
                error!(kernel = %facts.kernel, "{msg}");
                return Err(BootError::Capability(msg));
            }
        }
    }

    if facts.is_at_least_api(api::V) && facts.is_x86 && !facts.is_kernel_64bit {
        return Err(fail("Android V requires X86 kernel to be 64-bit."));
    }

    // 32-bit userspace against 64-bit kernel interfaces has known breakage
    // (jit, ring buffers) with no workaround on post-6.1 kernels.
    if facts.is_userspace_32bit && facts.kernel.is_at_least(USERSPACE_64BIT_FROM) {
        return Err(fail("64-bit userspace required on 6.2+ kernels."));
    }

    if !facts.build_type.is_known() {
        return Err(fail(&format!(
            "Failed to determine the build type: got '{}', want 'eng', 'user', or 'userdebug'",
            facts.build_type.as_str()
        )));
    }

    Ok(())
}

fn fail(msg: &str) -> BootError {
    error!("{msg}");
    BootError::Capability(msg.to_string())
}
