//! Operand resolution, trapped data access and stack helpers.

use crate::api::CoreState;
use crate::decoder::Fetched;
use crate::encoding::{AddressingMode, OpDescriptor};
use crate::fault::Fault;

/// Where an instruction's data operand lives once its bytes are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// No data operand.
    None,
    /// 8-bit immediate value.
    Imm8(u8),
    /// 16-bit immediate value.
    Imm16(u16),
    /// Accumulator `A`.
    AccA,
    /// Accumulator `B`.
    AccB,
    /// Effective memory address.
    Address(u16),
    /// Signed branch displacement.
    Relative(i8),
}

/// Everything the semantics need from the instruction bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operands {
    /// Data operand.
    pub operand: Operand,
    /// Bit mask for the `bset`/`bclr`/`brset`/`brclr` family.
    pub mask: u8,
    /// Branch displacement for `brset`/`brclr`.
    pub offset: i8,
}

/// Reads the operand bytes following the opcode. Instruction-stream bytes are
/// always read silently.
#[must_use]
pub fn resolve_operands(state: &CoreState, fetched: &Fetched, descriptor: OpDescriptor) -> Operands {
    let memory = &state.memory;
    let start = fetched.operand_addr();
    let operand = match descriptor.mode {
        AddressingMode::Inherent => Operand::None,
        AddressingMode::AccumulatorA => Operand::AccA,
        AddressingMode::AccumulatorB => Operand::AccB,
        AddressingMode::Immediate if descriptor.operation.is_wide() => {
            Operand::Imm16(memory.read_u16_silent(start))
        }
        AddressingMode::Immediate => Operand::Imm8(memory.read_silent(start)),
        AddressingMode::Direct => Operand::Address(u16::from(memory.read_silent(start))),
        AddressingMode::Extended => Operand::Address(memory.read_u16_silent(start)),
        AddressingMode::IndexedX => Operand::Address(offset_address(
            state.regs.x(),
            u16::from(memory.read_silent(start)),
        )),
        AddressingMode::IndexedY => Operand::Address(offset_address(
            state.regs.y(),
            u16::from(memory.read_silent(start)),
        )),
        AddressingMode::Relative => Operand::Relative(memory.read_signed_silent(start)),
    };

    let mask = if descriptor.operation.has_mask() {
        memory.read_silent(start.wrapping_add(1))
    } else {
        0
    };
    let offset = if descriptor.operation.is_bit_branch() {
        memory.read_signed_silent(start.wrapping_add(2))
    } else {
        0
    };

    Operands {
        operand,
        mask,
        offset,
    }
}

/// Adds an unsigned offset to a base address. A sum past `0xFFFF` wraps to
/// the bottom of memory and comes back with an [`Fault::AddressOutOfRange`]
/// carrying the unmasked address.
#[must_use]
pub fn wrapping_offset(base: u16, offset: u16) -> (u16, Option<Fault>) {
    let sum = u32::from(base) + u32::from(offset);
    let [_, _, high, low] = sum.to_be_bytes();
    let fault = (sum > u32::from(u16::MAX)).then_some(Fault::AddressOutOfRange { addr: sum });
    (u16::from_be_bytes([high, low]), fault)
}

/// [`wrapping_offset`] with any fault reported on the `log` facade.
#[must_use]
pub fn offset_address(base: u16, offset: u16) -> u16 {
    let (addr, fault) = wrapping_offset(base, offset);
    if let Some(fault) = fault {
        fault.report();
    }
    addr
}

/// Adds a signed displacement to a base address with 16-bit wraparound.
#[must_use]
pub fn relative_target(base: u16, offset: i8) -> u16 {
    base.wrapping_add_signed(i16::from(offset))
}

/// Trapped byte read attributed to the executing instruction.
pub fn read8(state: &mut CoreState, addr: u16) -> u8 {
    let instr = state.regs.last_pc();
    state.memory.read(addr, instr)
}

/// Trapped byte write attributed to the executing instruction.
pub fn write8(state: &mut CoreState, addr: u16, value: u8) {
    let instr = state.regs.last_pc();
    state.memory.write(addr, value, instr);
}

/// Trapped big-endian word read.
pub fn read16(state: &mut CoreState, addr: u16) -> u16 {
    let high = read8(state, addr);
    let low = read8(state, offset_address(addr, 1));
    u16::from_be_bytes([high, low])
}

/// Trapped big-endian word write.
pub fn write16(state: &mut CoreState, addr: u16, value: u16) {
    let [high, low] = value.to_be_bytes();
    write8(state, addr, high);
    write8(state, offset_address(addr, 1), low);
}

/// Reads an 8-bit data operand.
pub fn load8(state: &mut CoreState, operand: Operand) -> u8 {
    match operand {
        Operand::Imm8(value) => value,
        Operand::AccA => state.regs.a(),
        Operand::AccB => state.regs.b(),
        Operand::Address(addr) => read8(state, addr),
        Operand::Imm16(value) => value.to_be_bytes()[1],
        Operand::None | Operand::Relative(_) => 0,
    }
}

/// Writes an 8-bit data operand. Immediate and inherent forms are ignored.
pub fn store8(state: &mut CoreState, operand: Operand, value: u8) {
    match operand {
        Operand::AccA => state.regs.set_a(value),
        Operand::AccB => state.regs.set_b(value),
        Operand::Address(addr) => write8(state, addr, value),
        Operand::None | Operand::Imm8(_) | Operand::Imm16(_) | Operand::Relative(_) => {}
    }
}

/// Reads a 16-bit data operand.
pub fn load16(state: &mut CoreState, operand: Operand) -> u16 {
    match operand {
        Operand::Imm16(value) => value,
        Operand::Imm8(value) => u16::from(value),
        Operand::Address(addr) => read16(state, addr),
        Operand::AccA | Operand::AccB => state.regs.d(),
        Operand::None | Operand::Relative(_) => 0,
    }
}

/// Writes a 16-bit data operand to memory.
pub fn store16(state: &mut CoreState, operand: Operand, value: u16) {
    if let Operand::Address(addr) = operand {
        write16(state, addr, value);
    }
}

/// Pushes one byte: write at `SP`, then decrement.
pub fn push8(state: &mut CoreState, value: u8) {
    let sp = state.regs.sp();
    write8(state, sp, value);
    state.regs.set_sp(sp.wrapping_sub(1));
}

/// Pulls one byte: increment `SP`, then read.
pub fn pull8(state: &mut CoreState) -> u8 {
    let sp = state.regs.sp().wrapping_add(1);
    state.regs.set_sp(sp);
    read8(state, sp)
}

/// Pushes a word low byte first so it reads big-endian from `SP + 1`.
pub fn push16(state: &mut CoreState, value: u16) {
    let [high, low] = value.to_be_bytes();
    push8(state, low);
    push8(state, high);
}

/// Pulls a word pushed by [`push16`].
pub fn pull16(state: &mut CoreState) -> u16 {
    let high = pull8(state);
    let low = pull8(state);
    u16::from_be_bytes([high, low])
}
