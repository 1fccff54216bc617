//! Kernel capability probe — collects the facts every later gate reads.
//!
//! Facts are gathered once into a [`SystemFacts`] snapshot; the gate,
//! sysctl tuner and diagnostics only ever read that snapshot.

use std::collections::HashMap;
use std::ffi::CStr;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use super::version::KernelVersion;
use crate::error::BootError;

/// Platform API levels that carry kernel requirements.
pub mod api {
    pub const T: u32 = 33;
    pub const U: u32 = 34;
    pub const V: u32 = 35;
}

const SDK_PROPERTY: &str = "ro.build.version.sdk";
const BUILD_TYPE_PROPERTY: &str = "ro.build.type";

/// Self-reported build variant of the device image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildType {
    Eng,
    User,
    Userdebug,
    Unknown(String),
}

impl BuildType {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "eng" => BuildType::Eng,
            "user" => BuildType::User,
            "userdebug" => BuildType::Userdebug,
            other => BuildType::Unknown(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, BuildType::Unknown(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            BuildType::Eng => "eng",
            BuildType::User => "user",
            BuildType::Userdebug => "userdebug",
            BuildType::Unknown(s) => s,
        }
    }
}

/// Point-in-time answers about the running kernel and device image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFacts {
    pub kernel: KernelVersion,
    pub is_x86: bool,
    pub is_kernel_64bit: bool,
    pub is_userspace_32bit: bool,
    /// Device API level; 0 when it cannot be read.
    pub api_level: u32,
    pub build_type: BuildType,
}

impl SystemFacts {
    pub fn is_at_least_api(&self, level: u32) -> bool {
        self.api_level >= level
    }
}

/// Probe the running system: `uname(2)` for the kernel, the build
/// properties file for API level and build type.
pub fn detect(build_props: &Path) -> Result<SystemFacts, BootError> {
    let (release, machine) =
        uname().map_err(|e| BootError::Probe(format!("uname failed: {e}")))?;
    let props = match fs::read_to_string(build_props) {
        Ok(text) => parse_build_props(&text),
        Err(e) => {
            warn!(path = %build_props.display(), error = %e, "cannot read build properties");
            HashMap::new()
        }
    };
    from_parts(&release, &machine, &props)
}

/// Assemble facts from raw `uname` strings and parsed build properties.
pub fn from_parts(
    release: &str,
    machine: &str,
    props: &HashMap<String, String>,
) -> Result<SystemFacts, BootError> {
    let kernel = KernelVersion::parse_release(release)
        .ok_or_else(|| BootError::Probe(format!("unparseable kernel release '{release}'")))?;

    let api_level = match props.get(SDK_PROPERTY).map(|v| v.trim().parse::<u32>()) {
        Some(Ok(level)) => level,
        Some(Err(_)) | None => {
            warn!(property = SDK_PROPERTY, "device api level unavailable, assuming 0");
            0
        }
    };
    let build_type = BuildType::parse(props.get(BUILD_TYPE_PROPERTY).map_or("", String::as_str));

    debug!(%release, %machine, api_level, build_type = build_type.as_str(), "system facts");

    Ok(SystemFacts {
        kernel,
        is_x86: is_x86_machine(machine),
        is_kernel_64bit: is_64bit_machine(machine),
        is_userspace_32bit: cfg!(target_pointer_width = "32"),
        api_level,
        build_type,
    })
}

/// Parse `key=value` lines; blank lines and `#` comments are skipped.
pub fn parse_build_props(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn is_x86_machine(machine: &str) -> bool {
    matches!(machine, "x86_64" | "i386" | "i486" | "i586" | "i686")
}

// armv8l is a 64-bit arm kernel reporting a 32-bit personality.
fn is_64bit_machine(machine: &str) -> bool {
    matches!(machine, "x86_64" | "aarch64" | "armv8l" | "riscv64")
}

fn uname() -> io::Result<(String, String)> {
    // SAFETY: utsname is plain old data; all-zero is a valid value.
    let mut buf: libc::utsname = unsafe { std::mem::zeroed() };
    // SAFETY: buf is a valid, writable utsname.
    if unsafe { libc::uname(&mut buf) } != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: uname NUL-terminates every field it fills in.
    let release = unsafe { CStr::from_ptr(buf.release.as_ptr()) };
    let machine = unsafe { CStr::from_ptr(buf.machine.as_ptr()) };
    Ok((
        release.to_string_lossy().into_owned(),
        machine.to_string_lossy().into_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(text: &str) -> HashMap<String, String> {
        parse_build_props(text)
    }

    #[test]
    fn build_props_skip_comments_and_blanks() {
        let p = props("# header\n\nro.build.type=user\nro.build.version.sdk = 35\nnoequals\n");
        assert_eq!(p.get("ro.build.type").map(String::as_str), Some("user"));
        assert_eq!(p.get("ro.build.version.sdk").map(String::as_str), Some("35"));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn facts_from_arm64_device() {
        let p = props("ro.build.version.sdk=34\nro.build.type=userdebug\n");
        let f = from_parts("6.1.25-android14-11", "aarch64", &p).unwrap();
        assert_eq!(f.kernel, KernelVersion::new(6, 1, 25));
        assert!(!f.is_x86);
        assert!(f.is_kernel_64bit);
        assert_eq!(f.api_level, 34);
        assert_eq!(f.build_type, BuildType::Userdebug);
    }

    #[test]
    fn facts_from_32bit_x86_kernel() {
        let f = from_parts("4.19.0", "i686", &props("")).unwrap();
        assert!(f.is_x86);
        assert!(!f.is_kernel_64bit);
        assert_eq!(f.api_level, 0);
        assert_eq!(f.build_type, BuildType::Unknown(String::new()));
    }

    #[test]
    fn bad_release_is_a_probe_error() {
        let err = from_parts("unknown", "x86_64", &props("")).unwrap_err();
        assert!(matches!(err, BootError::Probe(_)));
    }

    #[test]
    fn build_type_round_trips_known_names() {
        for name in ["eng", "user", "userdebug"] {
            let t = BuildType::parse(name);
            assert!(t.is_known());
            assert_eq!(t.as_str(), name);
        }
        assert!(!BuildType::parse("debug").is_known());
    }

    #[test]
    fn detect_reads_running_kernel() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("build.prop");
        fs::write(&path, "ro.build.version.sdk=35\nro.build.type=eng\n").unwrap();
        let f = detect(&path).unwrap();
        assert!(f.kernel.major >= 2);
        assert_eq!(f.api_level, 35);
        assert_eq!(f.build_type, BuildType::Eng);
    }
}
