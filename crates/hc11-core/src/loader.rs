//! Program image loaders: Motorola S19, 32-bit ELF, raw binary and the
//! monitor hex-dump conversion.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::api::CoreState;
use crate::machine::Machine;

/// Anything a program image can be written into.
pub trait LoadTarget {
    /// Copies `data` into memory starting at `addr`.
    fn write_mem_block(&mut self, addr: u16, data: &[u8]);
    /// Sets the program counter.
    fn set_pc(&mut self, pc: u16);
}

impl LoadTarget for Machine {
    fn write_mem_block(&mut self, addr: u16, data: &[u8]) {
        Self::write_mem_block(self, addr, data);
    }

    fn set_pc(&mut self, pc: u16) {
        Self::set_pc(self, pc);
    }
}

impl LoadTarget for CoreState {
    fn write_mem_block(&mut self, addr: u16, data: &[u8]) {
        self.memory.write_block(addr, data);
    }

    fn set_pc(&mut self, pc: u16) {
        self.regs.set_pc(pc);
    }
}

/// Loader failures.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image file could not be read.
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    /// A non-blank S19 line does not start with `S`.
    #[error("line {line}: not an S-record")]
    NotSRecord {
        /// One-based line number.
        line: usize,
    },
    /// A record field is not valid hexadecimal.
    #[error("line {line}: invalid hex digits")]
    BadHex {
        /// One-based line number.
        line: usize,
    },
    /// A record is shorter than its byte count claims.
    #[error("line {line}: record is truncated")]
    TruncatedRecord {
        /// One-based line number.
        line: usize,
    },
    /// The file does not start with the ELF magic.
    #[error("not an ELF image")]
    BadElfMagic,
    /// A header or section reaches past the end of the file.
    #[error("ELF image truncated at offset 0x{offset:x}")]
    TruncatedElf {
        /// File offset that could not be read.
        offset: usize,
    },
}

/// Image container formats understood by [`load_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Motorola S-record text.
    S19,
    /// 32-bit big-endian ELF executable.
    Elf,
    /// Raw bytes loaded at a caller-chosen origin.
    Binary,
}

impl ImageFormat {
    /// Infers the format from a file extension: `.s19`/`.s` are S-records,
    /// `.elf` is ELF, anything else is a raw binary.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("s19" | "s") => Self::S19,
            Some("elf") => Self::Elf,
            _ => Self::Binary,
        }
    }

    /// Parses a `--format` value.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "s19" | "srec" => Some(Self::S19),
            "elf" => Some(Self::Elf),
            "bin" | "binary" => Some(Self::Binary),
            _ => None,
        }
    }
}

/// Loads S19 text. S1 records write their payload, S9 sets `PC` and ends
/// the load, other record types are skipped. Checksums are not verified.
///
/// # Errors
///
/// Returns [`LoadError::NotSRecord`] for a non-blank line without a leading
/// `S`, [`LoadError::BadHex`] for malformed digits and
/// [`LoadError::TruncatedRecord`] when a record is shorter than its count.
pub fn load_s19<T: LoadTarget + ?Sized>(target: &mut T, text: &str) -> Result<(), LoadError> {
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let record = raw.trim_end();
        if record.is_empty() {
            continue;
        }
        if !record.starts_with('S') {
            return Err(LoadError::NotSRecord { line });
        }

        match record.as_bytes().get(1) {
            Some(b'1') => {
                let count = hex_field(record, 2, 2, line)?;
                let addr = hex_field(record, 4, 4, line)?;
                let payload_len = usize::from(count).saturating_sub(3);
                let payload = (0..payload_len)
                    .map(|byte| {
                        hex_field(record, 8 + byte * 2, 2, line).and_then(|value| {
                            u8::try_from(value).map_err(|_| LoadError::BadHex { line })
                        })
                    })
                    .collect::<Result<Vec<u8>, LoadError>>()?;
                target.write_mem_block(addr, &payload);
            }
            Some(b'9') => {
                let entry = hex_field(record, 4, 4, line)?;
                target.set_pc(entry);
                return Ok(());
            }
            _ => {}
        }
    }
    Ok(())
}

fn hex_field(record: &str, start: usize, len: usize, line: usize) -> Result<u16, LoadError> {
    let digits = record
        .get(start..start + len)
        .ok_or(LoadError::TruncatedRecord { line })?;
    u16::from_str_radix(digits, 16).map_err(|_| LoadError::BadHex { line })
}

const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
const ELF_ENTRY_OFFSET: usize = 0x18;
const ELF_SEGMENT_COUNT_OFFSET: usize = 0x2D;
const ELF_SEGMENTS_OFFSET: usize = 0x38;
const ELF_SEGMENT_STRIDE: usize = 32;

/// Loads a 32-bit big-endian ELF image: every program header's file bytes are
/// copied to its virtual address, then `PC` is set to the entry point.
///
/// # Errors
///
/// Returns [`LoadError::BadElfMagic`] when the magic is missing and
/// [`LoadError::TruncatedElf`] when a header or segment runs past the file.
pub fn load_elf<T: LoadTarget + ?Sized>(target: &mut T, bytes: &[u8]) -> Result<(), LoadError> {
    if !bytes.starts_with(&ELF_MAGIC) {
        return Err(LoadError::BadElfMagic);
    }

    let entry = be_u32(bytes, ELF_ENTRY_OFFSET)?;
    let count = *bytes
        .get(ELF_SEGMENT_COUNT_OFFSET)
        .ok_or(LoadError::TruncatedElf {
            offset: ELF_SEGMENT_COUNT_OFFSET,
        })?;

    for index in 0..usize::from(count) {
        let header = ELF_SEGMENTS_OFFSET + index * ELF_SEGMENT_STRIDE;
        let file_offset = to_offset(be_u32(bytes, header)?);
        let vaddr = be_u32(bytes, header + 4)?;
        let size = to_offset(be_u32(bytes, header + 12)?);

        let end = file_offset.saturating_add(size);
        let data = bytes
            .get(file_offset..end)
            .ok_or(LoadError::TruncatedElf {
                offset: end.min(bytes.len()),
            })?;

        let addr = truncate_address(vaddr);
        if u32::from(addr) != vaddr || usize::from(addr) + data.len() > 0x1_0000 {
            log::warn!("ELF segment {index} at 0x{vaddr:x} does not fit the 16-bit address space");
        }
        target.write_mem_block(addr, data);
    }

    target.set_pc(truncate_address(entry));
    Ok(())
}

fn be_u32(bytes: &[u8], offset: usize) -> Result<u32, LoadError> {
    let field = bytes
        .get(offset..offset + 4)
        .ok_or(LoadError::TruncatedElf { offset })?;
    Ok(u32::from_be_bytes([field[0], field[1], field[2], field[3]]))
}

fn to_offset(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn truncate_address(value: u32) -> u16 {
    let [.., high, low] = value.to_be_bytes();
    u16::from_be_bytes([high, low])
}

/// Loads raw bytes at `org`. `PC` is left untouched.
pub fn load_binary<T: LoadTarget + ?Sized>(target: &mut T, bytes: &[u8], org: u16) {
    target.write_mem_block(org, bytes);
}

/// Converts a monitor memory dump to raw bytes.
///
/// Dump rows start with `/` and are exactly 43 characters long; columns
/// 9..41 carry 16 bytes as hex digit pairs. Everything else is ignored, as
/// are rows whose digits do not parse.
#[must_use]
pub fn convert_hex_dump(text: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    for row in text.lines() {
        let row = row.trim_end_matches('\r');
        if !row.starts_with('/') || row.len() != 43 {
            continue;
        }
        let Some(digits) = row.get(9..41) else {
            continue;
        };
        let decoded: Option<Vec<u8>> = (0..16)
            .map(|pair| {
                digits
                    .get(pair * 2..pair * 2 + 2)
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            })
            .collect();
        match decoded {
            Some(decoded) => bytes.extend(decoded),
            None => log::warn!("skipping malformed dump row {row:?}"),
        }
    }
    bytes
}

/// Reads `path` and loads it in `format`. `org` is only used for binaries.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, otherwise whatever
/// the format's loader reports.
pub fn load_file<T: LoadTarget + ?Sized>(
    target: &mut T,
    path: &Path,
    format: ImageFormat,
    org: u16,
) -> Result<(), LoadError> {
    match format {
        ImageFormat::S19 => load_s19(target, &fs::read_to_string(path)?),
        ImageFormat::Elf => load_elf(target, &fs::read(path)?),
        ImageFormat::Binary => {
            load_binary(target, &fs::read(path)?, org);
            Ok(())
        }
    }
}
