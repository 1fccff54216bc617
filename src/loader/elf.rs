//! Minimal ELF64 section-table reader.
//!
//! Only what the driver needs to classify an object: the section names.
//! Packet-filter objects are always 64-bit little-endian.

use thiserror::Error;

/// Name of the section that marks an object as boot-critical.
pub const CRITICAL_SECTION: &str = "critical";

const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];
const ELFCLASS64: u8 = 2;
const ELFDATA2LSB: u8 = 1;
const EHDR_SIZE: usize = 64;
const SHDR_SIZE: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ElfError {
    #[error("not an ELF file")]
    BadMagic,
    #[error("unsupported ELF class/encoding ({class}/{data})")]
    Unsupported { class: u8, data: u8 },
    #[error("truncated {0}")]
    Truncated(&'static str),
}

fn u16_at(b: &[u8], off: usize) -> Option<u16> {
    Some(u16::from_le_bytes(b.get(off..off + 2)?.try_into().ok()?))
}

fn u32_at(b: &[u8], off: usize) -> Option<u32> {
    Some(u32::from_le_bytes(b.get(off..off + 4)?.try_into().ok()?))
}

fn u64_at(b: &[u8], off: usize) -> Option<u64> {
    Some(u64::from_le_bytes(b.get(off..off + 8)?.try_into().ok()?))
}

struct Section {
    name: u32,
    offset: u64,
    size: u64,
}

fn section(bytes: &[u8], shoff: usize, index: usize) -> Result<Section, ElfError> {
    let base = index
        .checked_mul(SHDR_SIZE)
        .and_then(|o| o.checked_add(shoff))
        .ok_or(ElfError::Truncated("section header table"))?;
    let get = || -> Option<Section> {
        Some(Section {
            name: u32_at(bytes, base)?,
            offset: u64_at(bytes, base + 0x18)?,
            size: u64_at(bytes, base + 0x20)?,
        })
    };
    get().ok_or(ElfError::Truncated("section header table"))
}

/// Names of every section, in section-table order (index 0 included).
pub(crate) fn section_names(bytes: &[u8]) -> Result<Vec<String>, ElfError> {
    if bytes.len() < EHDR_SIZE {
        return Err(if bytes.starts_with(&ELF_MAGIC) || bytes.len() < 4 {
            ElfError::Truncated("ELF header")
        } else {
            ElfError::BadMagic
        });
    }
    if bytes[..4] != ELF_MAGIC {
        return Err(ElfError::BadMagic);
    }
    let (class, data) = (bytes[4], bytes[5]);
    if class != ELFCLASS64 || data != ELFDATA2LSB {
        return Err(ElfError::Unsupported { class, data });
    }

    let header = || -> Option<(u64, u16, u16, u16)> {
        Some((
            u64_at(bytes, 0x28)?,
            u16_at(bytes, 0x3a)?,
            u16_at(bytes, 0x3c)?,
            u16_at(bytes, 0x3e)?,
        ))
    };
    let (shoff, shentsize, shnum, shstrndx) = header().ok_or(ElfError::Truncated("ELF header"))?;
    if shnum == 0 {
        return Ok(Vec::new());
    }
    if shentsize as usize != SHDR_SIZE {
        return Err(ElfError::Truncated("section header entry"));
    }
    let shoff = usize::try_from(shoff).map_err(|_| ElfError::Truncated("section header table"))?;

    let strtab = section(bytes, shoff, shstrndx as usize)?;
    let start = strtab.offset as usize;
    let end = start
        .checked_add(strtab.size as usize)
        .filter(|end| *end <= bytes.len())
        .ok_or(ElfError::Truncated("section name table"))?;
    let names = &bytes[start..end];

    (0..shnum as usize)
        .map(|i| {
            let sh = section(bytes, shoff, i)?;
            let raw = names
                .get(sh.name as usize..)
                .ok_or(ElfError::Truncated("section name table"))?;
            let len = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
            Ok(String::from_utf8_lossy(&raw[..len]).into_owned())
        })
        .collect()
}

/// Whether the object carries a [`CRITICAL_SECTION`].
pub fn is_critical(bytes: &[u8]) -> Result<bool, ElfError> {
    Ok(section_names(bytes)?.iter().any(|n| n == CRITICAL_SECTION))
}

/// Build a section-only ELF64 LE object with the given extra sections.
#[cfg(test)]
pub(crate) fn build_object(sections: &[&str]) -> Vec<u8> {
    let mut strtab = vec![0u8];
    let mut name_offsets = Vec::new();
    for name in sections.iter().chain(std::iter::once(&".shstrtab")) {
        name_offsets.push(strtab.len() as u32);
        strtab.extend_from_slice(name.as_bytes());
        strtab.push(0);
    }
    let strtab_off = EHDR_SIZE;
    let shoff = (strtab_off + strtab.len()).next_multiple_of(8);
    let shnum = sections.len() + 2;

    let mut out = vec![0u8; shoff + shnum * SHDR_SIZE];
    out[..4].copy_from_slice(&ELF_MAGIC);
    out[4] = ELFCLASS64;
    out[5] = ELFDATA2LSB;
    out[6] = 1;
    out[0x10..0x12].copy_from_slice(&1u16.to_le_bytes()); // ET_REL
    out[0x12..0x14].copy_from_slice(&247u16.to_le_bytes()); // EM_BPF
    out[0x28..0x30].copy_from_slice(&(shoff as u64).to_le_bytes());
    out[0x34..0x36].copy_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
    out[0x3a..0x3c].copy_from_slice(&(SHDR_SIZE as u16).to_le_bytes());
    out[0x3c..0x3e].copy_from_slice(&(shnum as u16).to_le_bytes());
    out[0x3e..0x40].copy_from_slice(&((shnum - 1) as u16).to_le_bytes());
    out[strtab_off..strtab_off + strtab.len()].copy_from_slice(&strtab);

    // Index 0 stays the all-zero null section.
    for (i, name_off) in name_offsets.iter().enumerate() {
        let base = shoff + (i + 1) * SHDR_SIZE;
        out[base..base + 4].copy_from_slice(&name_off.to_le_bytes());
        if i == name_offsets.len() - 1 {
            out[base + 4..base + 8].copy_from_slice(&3u32.to_le_bytes()); // SHT_STRTAB
            out[base + 0x18..base + 0x20].copy_from_slice(&(strtab_off as u64).to_le_bytes());
            out[base + 0x20..base + 0x28].copy_from_slice(&(strtab.len() as u64).to_le_bytes());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_section_names() {
        let obj = build_object(&["license", "maps", "skfilter/egress"]);
        assert_eq!(
            section_names(&obj).unwrap(),
            ["", "license", "maps", "skfilter/egress", ".shstrtab"]
        );
    }

    #[test]
    fn critical_section_is_detected() {
        assert!(is_critical(&build_object(&["license", "critical"])).unwrap());
        assert!(!is_critical(&build_object(&["license", "critical_not"])).unwrap());
    }

    #[test]
    fn rejects_non_elf_input() {
        assert_eq!(section_names(b"#!/bin/sh\n"), Err(ElfError::BadMagic));
        assert_eq!(section_names(&[0x7f, b'E']), Err(ElfError::Truncated("ELF header")));
        let mut obj = build_object(&[]);
        obj[4] = 1;
        assert_eq!(section_names(&obj), Err(ElfError::Unsupported { class: 1, data: 1 }));
    }

    #[test]
    fn truncated_section_table_is_an_error() {
        let obj = build_object(&["license"]);
        let cut = &obj[..obj.len() - 40];
        assert!(matches!(section_names(cut), Err(ElfError::Truncated(_))));
    }
}
