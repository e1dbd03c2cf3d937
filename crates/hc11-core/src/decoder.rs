//! Prefix-aware instruction fetch shared by the executor and disassembler.
//!
//! Decoding only ever uses silent reads, so inspecting code never fires traps.

use crate::encoding::{dispatch_table, OpDescriptor, Page};
use crate::fault::Fault;
use crate::memory::MemoryBus;

/// Result of resolving the page and opcode byte at an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fetched {
    /// Address of the first byte (prefix or opcode).
    pub addr: u16,
    /// Page selected by the prefix, or [`Page::Primary`].
    pub page: Page,
    /// Opcode byte following any prefix.
    pub opcode: u8,
    /// Table entry, `None` when the opcode is unmapped on `page`.
    pub descriptor: Option<OpDescriptor>,
}

impl Fetched {
    /// Address of the first operand byte.
    #[must_use]
    pub fn operand_addr(&self) -> u16 {
        self.addr.wrapping_add(u16::from(self.opcode_len()))
    }

    /// Prefix plus opcode byte count.
    #[must_use]
    pub const fn opcode_len(&self) -> u8 {
        self.page.prefix_len() + 1
    }

    /// Full encoded length. Invalid opcodes span only the prefix and opcode byte.
    #[must_use]
    pub const fn size(&self) -> u8 {
        match self.descriptor {
            Some(descriptor) => self.opcode_len() + descriptor.operand_len(),
            None => self.opcode_len(),
        }
    }

    /// Resolves to the descriptor or an invalid-opcode fault.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::InvalidOpcode`] when the opcode is unmapped on its page.
    pub const fn descriptor_or_fault(&self) -> Result<OpDescriptor, Fault> {
        match self.descriptor {
            Some(descriptor) => Ok(descriptor),
            None => Err(Fault::InvalidOpcode {
                page: self.page,
                opcode: self.opcode,
                addr: self.addr,
            }),
        }
    }
}

/// Decodes the instruction starting at `addr` without triggering traps.
#[must_use]
pub fn decode_at(memory: &MemoryBus, addr: u16) -> Fetched {
    let first = memory.read_silent(addr);
    let (page, opcode) = match Page::from_prefix(first) {
        Some(page) => (page, memory.read_silent(addr.wrapping_add(1))),
        None => (Page::Primary, first),
    };

    Fetched {
        addr,
        page,
        opcode,
        descriptor: dispatch_table().lookup(page, opcode),
    }
}
