//! Kernel version triples.

use std::fmt;

/// A `major.minor.patch` kernel version.
///
/// Ordering is lexicographic over the three components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KernelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl KernelVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Packed `major << 16 | minor << 8 | patch` form, as the kernel's own
    /// `KERNEL_VERSION` macro builds it. Minor and patch saturate at 255.
    pub fn code(&self) -> u32 {
        (self.major << 16) | (self.minor.min(255) << 8) | self.patch.min(255)
    }

    pub fn is_at_least(&self, min: KernelVersion) -> bool {
        *self >= min
    }

    /// Parse a `uname -r` style release (`5.15.123-android14-11-g...`).
    ///
    /// Only the leading digits of each dot-separated component count;
    /// missing minor/patch components are zero. Returns `None` if there is
    /// no leading major number.
    pub fn parse_release(release: &str) -> Option<Self> {
        let mut parts = release.trim().splitn(3, '.');
        let major = leading_number(parts.next()?)?;
        let minor = parts.next().and_then(leading_number).unwrap_or(0);
        let patch = parts.next().and_then(leading_number).unwrap_or(0);
        Some(Self::new(major, minor, patch))
    }
}

fn leading_number(s: &str) -> Option<u32> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
