use thiserror::Error;

use crate::encoding::Page;

/// Non-fatal core diagnostics.
///
/// Faults are reported through step outcomes and the `log` facade. They never
/// stop the core; execution always continues with the next instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Opcode byte is unmapped on its page; executed as a no-op.
    #[error("unsupported opcode 0x{opcode:02x} on {page} at 0x{addr:04x}")]
    InvalidOpcode {
        /// Page the opcode was looked up on.
        page: Page,
        /// The unmapped opcode byte (after any prefix).
        opcode: u8,
        /// Address of the instruction that contained it.
        addr: u16,
    },
    /// An access ran past the end of the 16-bit address space and wrapped.
    #[error("address 0x{addr:x} is outside the 64 KiB address space")]
    AddressOutOfRange {
        /// The unmasked address.
        addr: u32,
    },
}

impl Fault {
    /// Emits this fault on the `log` facade at warning level.
    pub fn report(self) {
        log::warn!("{self}");
    }

    /// Returns `true` for invalid-opcode faults.
    #[must_use]
    pub const fn is_invalid_opcode(self) -> bool {
        matches!(self, Self::InvalidOpcode { .. })
    }
}
