//! Final canary: the kernel's map create/write path must actually work,
//! whatever the individual object loads reported.

use std::os::fd::AsFd;

use tracing::{debug, error};

use crate::error::BootError;
use crate::kernel::bpf::{BPF_ANY, BPF_MAP_TYPE_ARRAY, MapOps};

const KEY: u32 = 1;
const VALUE: u32 = 123;

/// Create a 2-element array map of `u32 -> u32` and write index 1.
pub fn check(maps: &dyn MapOps) -> Result<(), BootError> {
    let key_size = size_of::<u32>() as u32;
    let result = maps
        .create_map(BPF_MAP_TYPE_ARRAY, key_size, key_size, 2, 0)
        .and_then(|map| {
            maps.write_entry(map.as_fd(), &KEY.to_ne_bytes(), &VALUE.to_ne_bytes(), BPF_ANY)
        });

    match result {
        Ok(()) => {
            debug!("map write sanity check passed");
            Ok(())
        }
        Err(e) => {
            let msg = format!(
                "Critical kernel bug - failure to write into index 1 of 2 element bpf map array: {e}"
            );
            error!("{msg}");
            Err(BootError::Sanity(msg))
        }
    }
}
