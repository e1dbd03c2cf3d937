//! Instruction disassembly for the 68HC11.
//!
//! Disassembly decodes through the same dispatch table as the executor and
//! reads operand bytes only through the silent path, so inspecting memory
//! never fires read traps, charges cycles or changes state.

use crate::decoder::{decode_at, Fetched};
use crate::encoding::{system_mnemonic, AddressingMode, OpDescriptor};
use crate::memory::MemoryBus;

/// Mnemonic text used for unmapped opcodes.
pub const INVALID_TEXT: &str = "ERR";

/// Description used for unmapped opcodes.
pub const INVALID_DESCRIPTION: &str = "Invalid opcode!";

/// A single disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// Address of the first byte (prefix or opcode).
    pub addr: u16,
    /// Encoded length in bytes, including any page prefix.
    pub size: u8,
    /// Raw instruction bytes.
    pub bytes: Vec<u8>,
    /// Assembler text, e.g. `ldaa #0x05` or `bne 0x1000`.
    pub text: String,
    /// Human-readable summary of what the instruction does.
    pub description: String,
    /// Whether the opcode is unmapped on its page. Named system opcodes such
    /// as `swi` are still flagged, since the core executes them as invalid.
    pub is_invalid: bool,
}

/// Disassembles the instruction at `addr`.
#[must_use]
pub fn disassemble(memory: &MemoryBus, addr: u16) -> DecodedInstruction {
    let fetched = decode_at(memory, addr);
    let size = fetched.size();
    let bytes = (0..u16::from(size))
        .map(|offset| memory.read_silent(addr.wrapping_add(offset)))
        .collect();

    let Some(descriptor) = fetched.descriptor else {
        let (text, description) = system_mnemonic(fetched.page, fetched.opcode)
            .unwrap_or((INVALID_TEXT, INVALID_DESCRIPTION));
        return DecodedInstruction {
            addr,
            size,
            bytes,
            text: text.to_owned(),
            description: description.to_owned(),
            is_invalid: true,
        };
    };

    DecodedInstruction {
        addr,
        size,
        bytes,
        text: format_text(memory, &fetched, descriptor),
        description: descriptor.operation.summary().to_owned(),
        is_invalid: false,
    }
}

/// Disassembles `count` consecutive instructions starting at `start`.
#[must_use]
pub fn disassemble_window(memory: &MemoryBus, start: u16, count: usize) -> Vec<DecodedInstruction> {
    let mut rows = Vec::with_capacity(count);
    let mut pc = start;
    for _ in 0..count {
        let row = disassemble(memory, pc);
        pc = pc.wrapping_add(u16::from(row.size));
        rows.push(row);
    }
    rows
}

fn format_text(memory: &MemoryBus, fetched: &Fetched, descriptor: OpDescriptor) -> String {
    let operation = descriptor.operation;
    let operand_addr = fetched.operand_addr();
    let next_pc = fetched.addr.wrapping_add(u16::from(fetched.size()));
    let byte = memory.read_silent(operand_addr);

    let mut text = operation.mnemonic().to_owned();
    match descriptor.mode {
        AddressingMode::Inherent => {}
        AddressingMode::AccumulatorA => text.push('a'),
        AddressingMode::AccumulatorB => text.push('b'),
        AddressingMode::Immediate if operation.is_wide() => {
            text.push_str(&format!(" #0x{:04x}", memory.read_u16_silent(operand_addr)));
        }
        AddressingMode::Immediate => text.push_str(&format!(" #0x{byte:02x}")),
        AddressingMode::Direct => text.push_str(&format!(" 0x{byte:04x}")),
        AddressingMode::Extended => {
            text.push_str(&format!(" 0x{:04x}", memory.read_u16_silent(operand_addr)));
        }
        AddressingMode::IndexedX => text.push_str(&format!(" {byte},X")),
        AddressingMode::IndexedY => text.push_str(&format!(" {byte},Y")),
        AddressingMode::Relative => {
            let offset = memory.read_signed_silent(operand_addr);
            let target = next_pc.wrapping_add_signed(i16::from(offset));
            text.push_str(&format!(" 0x{target:04x}"));
        }
    }

    if operation.has_mask() {
        let mask = memory.read_silent(operand_addr.wrapping_add(1));
        text.push_str(&format!(" #0x{mask:02x}"));
    }
    if operation.is_bit_branch() {
        let offset = memory.read_signed_silent(operand_addr.wrapping_add(2));
        let target = next_pc.wrapping_add_signed(i16::from(offset));
        text.push_str(&format!(" 0x{target:04x}"));
    }

    text
}
