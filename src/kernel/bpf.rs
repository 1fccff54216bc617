//! Map create/write primitives over the `bpf(2)` syscall.

use std::io;
use std::mem;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

pub const BPF_MAP_TYPE_ARRAY: u32 = 2;

/// Create the element or update it in place.
pub const BPF_ANY: u64 = 0;

const BPF_MAP_CREATE: libc::c_int = 0;
const BPF_MAP_UPDATE_ELEM: libc::c_int = 2;

/// The two map operations the bootstrap needs from the kernel.
pub trait MapOps {
    fn create_map(
        &self,
        kind: u32,
        key_size: u32,
        value_size: u32,
        max_entries: u32,
        flags: u32,
    ) -> io::Result<OwnedFd>;

    fn write_entry(&self, map: BorrowedFd<'_>, key: &[u8], value: &[u8], flags: u64)
    -> io::Result<()>;
}

/// [`MapOps`] backed by the real syscall.
#[derive(Debug, Default, Clone, Copy)]
pub struct BpfSyscall;

#[repr(C)]
#[derive(Default)]
struct MapCreateAttr {
    map_type: u32,
    key_size: u32,
    value_size: u32,
    max_entries: u32,
    map_flags: u32,
}

#[repr(C)]
#[derive(Default)]
struct MapElemAttr {
    map_fd: u32,
    _pad: u32,
    key: u64,
    value: u64,
    flags: u64,
}

fn sys_bpf<T>(cmd: libc::c_int, attr: &T) -> io::Result<libc::c_long> {
    // SAFETY: attr is a live #[repr(C)] prefix of `union bpf_attr` and the
    // size passed matches it; the kernel zero-extends the remainder.
    let ret = unsafe {
        libc::syscall(
            libc::SYS_bpf,
            cmd,
            attr as *const T as *const libc::c_void,
            mem::size_of::<T>() as libc::c_uint,
        )
    };
    if ret < 0 { Err(io::Error::last_os_error()) } else { Ok(ret) }
}

impl MapOps for BpfSyscall {
    fn create_map(
        &self,
        kind: u32,
        key_size: u32,
        value_size: u32,
        max_entries: u32,
        flags: u32,
    ) -> io::Result<OwnedFd> {
        let attr = MapCreateAttr {
            map_type: kind,
            key_size,
            value_size,
            max_entries,
            map_flags: flags,
        };
        let fd = sys_bpf(BPF_MAP_CREATE, &attr)?;
        // SAFETY: a successful BPF_MAP_CREATE returns a new fd we now own.
        Ok(unsafe { OwnedFd::from_raw_fd(fd as RawFd) })
    }

    fn write_entry(
        &self,
        map: BorrowedFd<'_>,
        key: &[u8],
        value: &[u8],
        flags: u64,
    ) -> io::Result<()> {
        let attr = MapElemAttr {
            map_fd: map.as_raw_fd() as u32,
            key: key.as_ptr() as u64,
            value: value.as_ptr() as u64,
            flags,
            ..Default::default()
        };
        sys_bpf(BPF_MAP_UPDATE_ELEM, &attr).map(|_| ())
    }
}
