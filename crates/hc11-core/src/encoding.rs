//! Opcode pages, addressing modes and the single source-of-truth opcode table.
//!
//! Both the executor and the disassembler resolve `(page, opcode)` through the
//! same [`DispatchTable`], so prefix handling lives in exactly one place.

#![allow(clippy::too_many_lines)]

use std::fmt;
use std::sync::OnceLock;

/// Opcode page. Pages 2-4 are selected by a one-byte prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Page {
    /// Primary 256-entry table, no prefix.
    Primary,
    /// Selected by prefix `0x18` (mostly `Y`-indexed forms).
    Page2,
    /// Selected by prefix `0x1A`.
    Page3,
    /// Selected by prefix `0xCD`.
    Page4,
}

impl Page {
    /// All pages in table order.
    pub const ALL: [Self; 4] = [Self::Primary, Self::Page2, Self::Page3, Self::Page4];

    /// Maps a page-select prefix byte to its page.
    #[must_use]
    pub const fn from_prefix(byte: u8) -> Option<Self> {
        match byte {
            0x18 => Some(Self::Page2),
            0x1A => Some(Self::Page3),
            0xCD => Some(Self::Page4),
            _ => None,
        }
    }

    /// Prefix byte that selects this page, if any.
    #[must_use]
    pub const fn prefix(self) -> Option<u8> {
        match self {
            Self::Primary => None,
            Self::Page2 => Some(0x18),
            Self::Page3 => Some(0x1A),
            Self::Page4 => Some(0xCD),
        }
    }

    /// Number of prefix bytes consumed before the opcode byte.
    #[must_use]
    pub const fn prefix_len(self) -> u8 {
        match self {
            Self::Primary => 0,
            Self::Page2 | Self::Page3 | Self::Page4 => 1,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Page2 => 1,
            Self::Page3 => 2,
            Self::Page4 => 3,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix() {
            None => f.write_str("page 0"),
            Some(prefix) => write!(f, "page {} (prefix 0x{prefix:02x})", self.index() + 1),
        }
    }
}

/// How an instruction locates its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AddressingMode {
    /// No operand bytes.
    Inherent,
    /// Operand bytes follow the opcode.
    Immediate,
    /// One-byte address in page zero.
    Direct,
    /// Two-byte big-endian address.
    Extended,
    /// Unsigned byte offset from `X`.
    IndexedX,
    /// Unsigned byte offset from `Y`.
    IndexedY,
    /// Signed byte offset from the following instruction.
    Relative,
    /// Operand is accumulator `A`, no memory access.
    AccumulatorA,
    /// Operand is accumulator `B`, no memory access.
    AccumulatorB,
}

impl AddressingMode {
    /// Number of operand bytes this mode adds after the opcode.
    ///
    /// Immediate width depends on the operation, see [`Operation::is_wide`].
    #[must_use]
    pub const fn operand_len(self, wide: bool) -> u8 {
        match self {
            Self::Inherent | Self::AccumulatorA | Self::AccumulatorB => 0,
            Self::Direct | Self::IndexedX | Self::IndexedY | Self::Relative => 1,
            Self::Extended => 2,
            Self::Immediate => {
                if wide {
                    2
                } else {
                    1
                }
            }
        }
    }

    /// Returns `true` when the mode resolves to a memory address.
    #[must_use]
    pub const fn is_memory(self) -> bool {
        matches!(
            self,
            Self::Direct | Self::Extended | Self::IndexedX | Self::IndexedY
        )
    }
}

/// One variant per 68HC11 mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Operation {
    Nop,
    Idiv,
    Fdiv,
    Lsrd,
    Asld,
    Tap,
    Tpa,
    Inx,
    Dex,
    Clv,
    Sev,
    Clc,
    Sec,
    Cli,
    Sei,
    Sba,
    Cba,
    Brset,
    Brclr,
    Bset,
    Bclr,
    Tab,
    Tba,
    Daa,
    Aba,
    Bra,
    Brn,
    Bhi,
    Bls,
    Bcc,
    Bcs,
    Bne,
    Beq,
    Bvc,
    Bvs,
    Bpl,
    Bmi,
    Bge,
    Blt,
    Bgt,
    Ble,
    Tsx,
    Ins,
    Pula,
    Pulb,
    Des,
    Txs,
    Psha,
    Pshb,
    Pulx,
    Rts,
    Abx,
    Rti,
    Pshx,
    Mul,
    Neg,
    Com,
    Lsr,
    Ror,
    Asr,
    Asl,
    Rol,
    Dec,
    Inc,
    Tst,
    Jmp,
    Clr,
    Suba,
    Cmpa,
    Sbca,
    Subd,
    Anda,
    Bita,
    Ldaa,
    Staa,
    Eora,
    Adca,
    Oraa,
    Adda,
    Cpx,
    Bsr,
    Jsr,
    Lds,
    Sts,
    Xgdx,
    Subb,
    Cmpb,
    Sbcb,
    Addd,
    Andb,
    Bitb,
    Ldab,
    Stab,
    Eorb,
    Adcb,
    Orab,
    Addb,
    Ldd,
    Std,
    Ldx,
    Stx,
    Iny,
    Dey,
    Tsy,
    Tys,
    Puly,
    Aby,
    Pshy,
    Xgdy,
    Cpy,
    Ldy,
    Sty,
    Cpd,
}

impl Operation {
    /// Lower-case assembler mnemonic. Accumulator forms of the
    /// read-modify-write family get their `a`/`b` suffix from the mode.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::Idiv => "idiv",
            Self::Fdiv => "fdiv",
            Self::Lsrd => "lsrd",
            Self::Asld => "asld",
            Self::Tap => "tap",
            Self::Tpa => "tpa",
            Self::Inx => "inx",
            Self::Dex => "dex",
            Self::Clv => "clv",
            Self::Sev => "sev",
            Self::Clc => "clc",
            Self::Sec => "sec",
            Self::Cli => "cli",
            Self::Sei => "sei",
            Self::Sba => "sba",
            Self::Cba => "cba",
            Self::Brset => "brset",
            Self::Brclr => "brclr",
            Self::Bset => "bset",
            Self::Bclr => "bclr",
            Self::Tab => "tab",
            Self::Tba => "tba",
            Self::Daa => "daa",
            Self::Aba => "aba",
            Self::Bra => "bra",
            Self::Brn => "brn",
            Self::Bhi => "bhi",
            Self::Bls => "bls",
            Self::Bcc => "bcc",
            Self::Bcs => "bcs",
            Self::Bne => "bne",
            Self::Beq => "beq",
            Self::Bvc => "bvc",
            Self::Bvs => "bvs",
            Self::Bpl => "bpl",
            Self::Bmi => "bmi",
            Self::Bge => "bge",
            Self::Blt => "blt",
            Self::Bgt => "bgt",
            Self::Ble => "ble",
            Self::Tsx => "tsx",
            Self::Ins => "ins",
            Self::Pula => "pula",
            Self::Pulb => "pulb",
            Self::Des => "des",
            Self::Txs => "txs",
            Self::Psha => "psha",
            Self::Pshb => "pshb",
            Self::Pulx => "pulx",
            Self::Rts => "rts",
            Self::Abx => "abx",
            Self::Rti => "rti",
            Self::Pshx => "pshx",
            Self::Mul => "mul",
            Self::Neg => "neg",
            Self::Com => "com",
            Self::Lsr => "lsr",
            Self::Ror => "ror",
            Self::Asr => "asr",
            Self::Asl => "asl",
            Self::Rol => "rol",
            Self::Dec => "dec",
            Self::Inc => "inc",
            Self::Tst => "tst",
            Self::Jmp => "jmp",
            Self::Clr => "clr",
            Self::Suba => "suba",
            Self::Cmpa => "cmpa",
            Self::Sbca => "sbca",
            Self::Subd => "subd",
            Self::Anda => "anda",
            Self::Bita => "bita",
            Self::Ldaa => "ldaa",
            Self::Staa => "staa",
            Self::Eora => "eora",
            Self::Adca => "adca",
            Self::Oraa => "oraa",
            Self::Adda => "adda",
            Self::Cpx => "cpx",
            Self::Bsr => "bsr",
            Self::Jsr => "jsr",
            Self::Lds => "lds",
            Self::Sts => "sts",
            Self::Xgdx => "xgdx",
            Self::Subb => "subb",
            Self::Cmpb => "cmpb",
            Self::Sbcb => "sbcb",
            Self::Addd => "addd",
            Self::Andb => "andb",
            Self::Bitb => "bitb",
            Self::Ldab => "ldab",
            Self::Stab => "stab",
            Self::Eorb => "eorb",
            Self::Adcb => "adcb",
            Self::Orab => "orab",
            Self::Addb => "addb",
            Self::Ldd => "ldd",
            Self::Std => "std",
            Self::Ldx => "ldx",
            Self::Stx => "stx",
            Self::Iny => "iny",
            Self::Dey => "dey",
            Self::Tsy => "tsy",
            Self::Tys => "tys",
            Self::Puly => "puly",
            Self::Aby => "aby",
            Self::Pshy => "pshy",
            Self::Xgdy => "xgdy",
            Self::Cpy => "cpy",
            Self::Ldy => "ldy",
            Self::Sty => "sty",
            Self::Cpd => "cpd",
        }
    }

    /// Returns `true` for operations whose immediate operand is 16 bits.
    #[must_use]
    pub const fn is_wide(self) -> bool {
        matches!(
            self,
            Self::Subd
                | Self::Addd
                | Self::Cpd
                | Self::Cpx
                | Self::Cpy
                | Self::Ldd
                | Self::Lds
                | Self::Ldx
                | Self::Ldy
        )
    }

    /// Returns `true` for the bit-manipulation family that carries a mask byte.
    #[must_use]
    pub const fn has_mask(self) -> bool {
        matches!(self, Self::Bset | Self::Bclr | Self::Brset | Self::Brclr)
    }

    /// Returns `true` for `brset`/`brclr`, which end with a relative offset.
    #[must_use]
    pub const fn is_bit_branch(self) -> bool {
        matches!(self, Self::Brset | Self::Brclr)
    }

    /// Short human-readable summary used by the disassembler.
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::Nop => "Perform no operation.",
            Self::Idiv => "Integer divide D by X; quotient to X, remainder to D.",
            Self::Fdiv => "Fractional divide D by X; quotient to X, remainder to D.",
            Self::Lsrd => "Logically shift D right once.",
            Self::Asld => "Arithmetically shift D left once.",
            Self::Tap => "Transfer accumulator A into the CCR.",
            Self::Tpa => "Transfer the CCR into accumulator A.",
            Self::Inx => "Increment X.",
            Self::Dex => "Decrement X.",
            Self::Clv => "Clear the overflow flag.",
            Self::Sev => "Set the overflow flag.",
            Self::Clc => "Clear the carry flag.",
            Self::Sec => "Set the carry flag.",
            Self::Cli => "Clear the interrupt mask, enabling interrupts.",
            Self::Sei => "Set the interrupt mask, disabling interrupts.",
            Self::Sba => "Subtract B from A; result in A.",
            Self::Cba => "Compare A to B.",
            Self::Brset => "Branch if all mask bits are set in the operand.",
            Self::Brclr => "Branch if all mask bits are clear in the operand.",
            Self::Bset => "Set the mask bits in the operand.",
            Self::Bclr => "Clear the mask bits in the operand.",
            Self::Tab => "Transfer A to B.",
            Self::Tba => "Transfer B to A.",
            Self::Daa => "Decimal adjust accumulator A.",
            Self::Aba => "Add B to A; result in A.",
            Self::Bra => "Branch always.",
            Self::Brn => "Branch never.",
            Self::Bhi => "Branch if higher (unsigned).",
            Self::Bls => "Branch if lower or same (unsigned).",
            Self::Bcc => "Branch if carry clear.",
            Self::Bcs => "Branch if carry set.",
            Self::Bne => "Branch if not equal.",
            Self::Beq => "Branch if equal.",
            Self::Bvc => "Branch if overflow clear.",
            Self::Bvs => "Branch if overflow set.",
            Self::Bpl => "Branch if plus.",
            Self::Bmi => "Branch if minus.",
            Self::Bge => "Branch if greater than or equal (signed).",
            Self::Blt => "Branch if less than (signed).",
            Self::Bgt => "Branch if greater than (signed).",
            Self::Ble => "Branch if less than or equal (signed).",
            Self::Tsx => "Transfer SP + 1 to X.",
            Self::Ins => "Increment SP.",
            Self::Pula => "Pull A from the stack.",
            Self::Pulb => "Pull B from the stack.",
            Self::Des => "Decrement SP.",
            Self::Txs => "Transfer X - 1 to SP.",
            Self::Psha => "Push A onto the stack.",
            Self::Pshb => "Push B onto the stack.",
            Self::Pulx => "Pull X from the stack.",
            Self::Rts => "Return from subroutine.",
            Self::Abx => "Add B to X.",
            Self::Rti => "Return from interrupt.",
            Self::Pshx => "Push X onto the stack.",
            Self::Mul => "Multiply A by B; result in D.",
            Self::Neg => "Two's complement negate.",
            Self::Com => "One's complement.",
            Self::Lsr => "Logical shift right.",
            Self::Ror => "Rotate right through carry.",
            Self::Asr => "Arithmetic shift right.",
            Self::Asl => "Arithmetic shift left.",
            Self::Rol => "Rotate left through carry.",
            Self::Dec => "Decrement.",
            Self::Inc => "Increment.",
            Self::Tst => "Test for zero or minus.",
            Self::Jmp => "Jump.",
            Self::Clr => "Clear to zero.",
            Self::Suba => "Subtract the operand from A.",
            Self::Cmpa => "Compare A to the operand.",
            Self::Sbca => "Subtract the operand and carry from A.",
            Self::Subd => "Subtract the 16-bit operand from D.",
            Self::Anda => "AND A with the operand.",
            Self::Bita => "Bit test A against the operand.",
            Self::Ldaa => "Load A.",
            Self::Staa => "Store A.",
            Self::Eora => "Exclusive-OR A with the operand.",
            Self::Adca => "Add the operand and carry to A.",
            Self::Oraa => "Inclusive-OR A with the operand.",
            Self::Adda => "Add the operand to A.",
            Self::Cpx => "Compare X to the 16-bit operand.",
            Self::Bsr => "Branch to subroutine.",
            Self::Jsr => "Jump to subroutine.",
            Self::Lds => "Load SP.",
            Self::Sts => "Store SP.",
            Self::Xgdx => "Exchange D and X.",
            Self::Subb => "Subtract the operand from B.",
            Self::Cmpb => "Compare B to the operand.",
            Self::Sbcb => "Subtract the operand and carry from B.",
            Self::Addd => "Add the 16-bit operand to D.",
            Self::Andb => "AND B with the operand.",
            Self::Bitb => "Bit test B against the operand.",
            Self::Ldab => "Load B.",
            Self::Stab => "Store B.",
            Self::Eorb => "Exclusive-OR B with the operand.",
            Self::Adcb => "Add the operand and carry to B.",
            Self::Orab => "Inclusive-OR B with the operand.",
            Self::Addb => "Add the operand to B.",
            Self::Ldd => "Load D.",
            Self::Std => "Store D.",
            Self::Ldx => "Load X.",
            Self::Stx => "Store X.",
            Self::Iny => "Increment Y.",
            Self::Dey => "Decrement Y.",
            Self::Tsy => "Transfer SP + 1 to Y.",
            Self::Tys => "Transfer Y - 1 to SP.",
            Self::Puly => "Pull Y from the stack.",
            Self::Aby => "Add B to Y.",
            Self::Pshy => "Push Y onto the stack.",
            Self::Xgdy => "Exchange D and Y.",
            Self::Cpy => "Compare Y to the 16-bit operand.",
            Self::Ldy => "Load Y.",
            Self::Sty => "Store Y.",
            Self::Cpd => "Compare D to the 16-bit operand.",
        }
    }
}

/// A decoded table entry: what to run, how to find its operand, what it costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct OpDescriptor {
    /// Semantics to invoke.
    pub operation: Operation,
    /// Addressing mode passed to the semantics.
    pub mode: AddressingMode,
    /// Fixed cycle cost charged on retirement.
    pub cycles: u8,
}

impl OpDescriptor {
    /// Bytes following the opcode byte (operand, mask and branch offset).
    #[must_use]
    pub const fn operand_len(self) -> u8 {
        let mut len = self.mode.operand_len(self.operation.is_wide());
        if self.operation.has_mask() {
            len += 1;
        }
        if self.operation.is_bit_branch() {
            len += 1;
        }
        len
    }
}

use self::AddressingMode::{
    AccumulatorA as AccA, AccumulatorB as AccB, Direct as Dir, Extended as Ext,
    Immediate as Imm, IndexedX as IndX, IndexedY as IndY, Inherent as Inh, Relative as Rel,
};
use self::Operation as Op;
use self::Page::{Page2 as P2, Page3 as P3, Page4 as P4, Primary as P0};

/// Single source-of-truth opcode table: `(page, opcode, operation, mode, cycles)`.
///
/// Any `(page, opcode)` pair not present here is an invalid opcode. The page
/// prefixes themselves (`0x18`, `0x1A`, `0xCD`) never appear as primary rows.
pub const OPCODE_TABLE: &[(Page, u8, Operation, AddressingMode, u8)] = &[
    (P0, 0x01, Op::Nop, Inh, 2),
    (P0, 0x02, Op::Idiv, Inh, 41),
    (P0, 0x03, Op::Fdiv, Inh, 41),
    (P0, 0x04, Op::Lsrd, Inh, 3),
    (P0, 0x05, Op::Asld, Inh, 3),
    (P0, 0x06, Op::Tap, Inh, 2),
    (P0, 0x07, Op::Tpa, Inh, 2),
    (P0, 0x08, Op::Inx, Inh, 3),
    (P0, 0x09, Op::Dex, Inh, 3),
    (P0, 0x0A, Op::Clv, Inh, 2),
    (P0, 0x0B, Op::Sev, Inh, 2),
    (P0, 0x0C, Op::Clc, Inh, 2),
    (P0, 0x0D, Op::Sec, Inh, 2),
    (P0, 0x0E, Op::Cli, Inh, 2),
    (P0, 0x0F, Op::Sei, Inh, 2),
    (P0, 0x10, Op::Sba, Inh, 2),
    (P0, 0x11, Op::Cba, Inh, 2),
    (P0, 0x12, Op::Brset, Dir, 6),
    (P0, 0x13, Op::Brclr, Dir, 6),
    (P0, 0x14, Op::Bset, Dir, 6),
    (P0, 0x15, Op::Bclr, Dir, 6),
    (P0, 0x16, Op::Tab, Inh, 2),
    (P0, 0x17, Op::Tba, Inh, 2),
    (P0, 0x19, Op::Daa, Inh, 2),
    (P0, 0x1B, Op::Aba, Inh, 2),
    (P0, 0x1C, Op::Bset, IndX, 7),
    (P0, 0x1D, Op::Bclr, IndX, 7),
    (P0, 0x1E, Op::Brset, IndX, 7),
    (P0, 0x1F, Op::Brclr, IndX, 7),
    (P0, 0x20, Op::Bra, Rel, 3),
    (P0, 0x21, Op::Brn, Rel, 3),
    (P0, 0x22, Op::Bhi, Rel, 3),
    (P0, 0x23, Op::Bls, Rel, 3),
    (P0, 0x24, Op::Bcc, Rel, 3),
    (P0, 0x25, Op::Bcs, Rel, 3),
    (P0, 0x26, Op::Bne, Rel, 3),
    (P0, 0x27, Op::Beq, Rel, 3),
    (P0, 0x28, Op::Bvc, Rel, 3),
    (P0, 0x29, Op::Bvs, Rel, 3),
    (P0, 0x2A, Op::Bpl, Rel, 3),
    (P0, 0x2B, Op::Bmi, Rel, 3),
    (P0, 0x2C, Op::Bge, Rel, 3),
    (P0, 0x2D, Op::Blt, Rel, 3),
    (P0, 0x2E, Op::Bgt, Rel, 3),
    (P0, 0x2F, Op::Ble, Rel, 3),
    (P0, 0x30, Op::Tsx, Inh, 3),
    (P0, 0x31, Op::Ins, Inh, 3),
    (P0, 0x32, Op::Pula, Inh, 4),
    (P0, 0x33, Op::Pulb, Inh, 4),
    (P0, 0x34, Op::Des, Inh, 3),
    (P0, 0x35, Op::Txs, Inh, 3),
    (P0, 0x36, Op::Psha, Inh, 3),
    (P0, 0x37, Op::Pshb, Inh, 3),
    (P0, 0x38, Op::Pulx, Inh, 5),
    (P0, 0x39, Op::Rts, Inh, 5),
    (P0, 0x3A, Op::Abx, Inh, 3),
    (P0, 0x3B, Op::Rti, Inh, 12),
    (P0, 0x3C, Op::Pshx, Inh, 4),
    (P0, 0x3D, Op::Mul, Inh, 10),
    (P0, 0x40, Op::Neg, AccA, 2),
    (P0, 0x43, Op::Com, AccA, 2),
    (P0, 0x44, Op::Lsr, AccA, 2),
    (P0, 0x46, Op::Ror, AccA, 2),
    (P0, 0x47, Op::Asr, AccA, 2),
    (P0, 0x48, Op::Asl, AccA, 2),
    (P0, 0x49, Op::Rol, AccA, 2),
    (P0, 0x4A, Op::Dec, AccA, 2),
    (P0, 0x4C, Op::Inc, AccA, 2),
    (P0, 0x4D, Op::Tst, AccA, 2),
    (P0, 0x4F, Op::Clr, AccA, 2),
    (P0, 0x50, Op::Neg, AccB, 2),
    (P0, 0x53, Op::Com, AccB, 2),
    (P0, 0x54, Op::Lsr, AccB, 2),
    (P0, 0x56, Op::Ror, AccB, 2),
    (P0, 0x57, Op::Asr, AccB, 2),
    (P0, 0x58, Op::Asl, AccB, 2),
    (P0, 0x59, Op::Rol, AccB, 2),
    (P0, 0x5A, Op::Dec, AccB, 2),
    (P0, 0x5C, Op::Inc, AccB, 2),
    (P0, 0x5D, Op::Tst, AccB, 2),
    (P0, 0x5F, Op::Clr, AccB, 2),
    (P0, 0x60, Op::Neg, IndX, 6),
    (P0, 0x63, Op::Com, IndX, 6),
    (P0, 0x64, Op::Lsr, IndX, 6),
    (P0, 0x66, Op::Ror, IndX, 6),
    (P0, 0x67, Op::Asr, IndX, 6),
    (P0, 0x68, Op::Asl, IndX, 6),
    (P0, 0x69, Op::Rol, IndX, 6),
    (P0, 0x6A, Op::Dec, IndX, 6),
    (P0, 0x6C, Op::Inc, IndX, 6),
    (P0, 0x6D, Op::Tst, IndX, 6),
    (P0, 0x6E, Op::Jmp, IndX, 3),
    (P0, 0x6F, Op::Clr, IndX, 6),
    (P0, 0x70, Op::Neg, Ext, 6),
    (P0, 0x73, Op::Com, Ext, 6),
    (P0, 0x74, Op::Lsr, Ext, 6),
    (P0, 0x76, Op::Ror, Ext, 6),
    (P0, 0x77, Op::Asr, Ext, 6),
    (P0, 0x78, Op::Asl, Ext, 6),
    (P0, 0x79, Op::Rol, Ext, 6),
    (P0, 0x7A, Op::Dec, Ext, 6),
    (P0, 0x7C, Op::Inc, Ext, 6),
    (P0, 0x7D, Op::Tst, Ext, 6),
    (P0, 0x7E, Op::Jmp, Ext, 3),
    (P0, 0x7F, Op::Clr, Ext, 6),
    (P0, 0x80, Op::Suba, Imm, 2),
    (P0, 0x81, Op::Cmpa, Imm, 2),
    (P0, 0x82, Op::Sbca, Imm, 2),
    (P0, 0x83, Op::Subd, Imm, 4),
    (P0, 0x84, Op::Anda, Imm, 2),
    (P0, 0x85, Op::Bita, Imm, 2),
    (P0, 0x86, Op::Ldaa, Imm, 2),
    (P0, 0x88, Op::Eora, Imm, 2),
    (P0, 0x89, Op::Adca, Imm, 2),
    (P0, 0x8A, Op::Oraa, Imm, 2),
    (P0, 0x8B, Op::Adda, Imm, 2),
    (P0, 0x8C, Op::Cpx, Imm, 4),
    (P0, 0x8D, Op::Bsr, Rel, 6),
    (P0, 0x8E, Op::Lds, Imm, 3),
    (P0, 0x8F, Op::Xgdx, Inh, 3),
    (P0, 0x90, Op::Suba, Dir, 3),
    (P0, 0x91, Op::Cmpa, Dir, 3),
    (P0, 0x92, Op::Sbca, Dir, 3),
    (P0, 0x93, Op::Subd, Dir, 5),
    (P0, 0x94, Op::Anda, Dir, 3),
    (P0, 0x95, Op::Bita, Dir, 3),
    (P0, 0x96, Op::Ldaa, Dir, 3),
    (P0, 0x97, Op::Staa, Dir, 3),
    (P0, 0x98, Op::Eora, Dir, 3),
    (P0, 0x99, Op::Adca, Dir, 3),
    (P0, 0x9A, Op::Oraa, Dir, 3),
    (P0, 0x9B, Op::Adda, Dir, 3),
    (P0, 0x9C, Op::Cpx, Dir, 5),
    (P0, 0x9D, Op::Jsr, Dir, 5),
    (P0, 0x9E, Op::Lds, Dir, 4),
    (P0, 0x9F, Op::Sts, Dir, 4),
    (P0, 0xA0, Op::Suba, IndX, 4),
    (P0, 0xA1, Op::Cmpa, IndX, 4),
    (P0, 0xA2, Op::Sbca, IndX, 4),
    (P0, 0xA3, Op::Subd, IndX, 6),
    (P0, 0xA4, Op::Anda, IndX, 4),
    (P0, 0xA5, Op::Bita, IndX, 4),
    (P0, 0xA6, Op::Ldaa, IndX, 4),
    (P0, 0xA7, Op::Staa, IndX, 4),
    (P0, 0xA8, Op::Eora, IndX, 4),
    (P0, 0xA9, Op::Adca, IndX, 4),
    (P0, 0xAA, Op::Oraa, IndX, 4),
    (P0, 0xAB, Op::Adda, IndX, 4),
    (P0, 0xAC, Op::Cpx, IndX, 6),
    (P0, 0xAD, Op::Jsr, IndX, 6),
    (P0, 0xAE, Op::Lds, IndX, 5),
    (P0, 0xAF, Op::Sts, IndX, 5),
    (P0, 0xB0, Op::Suba, Ext, 4),
    (P0, 0xB1, Op::Cmpa, Ext, 4),
    (P0, 0xB2, Op::Sbca, Ext, 4),
    (P0, 0xB3, Op::Subd, Ext, 6),
    (P0, 0xB4, Op::Anda, Ext, 4),
    (P0, 0xB5, Op::Bita, Ext, 4),
    (P0, 0xB6, Op::Ldaa, Ext, 4),
    (P0, 0xB7, Op::Staa, Ext, 4),
    (P0, 0xB8, Op::Eora, Ext, 4),
    (P0, 0xB9, Op::Adca, Ext, 4),
    (P0, 0xBA, Op::Oraa, Ext, 4),
    (P0, 0xBB, Op::Adda, Ext, 4),
    (P0, 0xBC, Op::Cpx, Ext, 6),
    (P0, 0xBD, Op::Jsr, Ext, 6),
    (P0, 0xBE, Op::Lds, Ext, 5),
    (P0, 0xBF, Op::Sts, Ext, 5),
    (P0, 0xC0, Op::Subb, Imm, 2),
    (P0, 0xC1, Op::Cmpb, Imm, 2),
    (P0, 0xC2, Op::Sbcb, Imm, 2),
    (P0, 0xC3, Op::Addd, Imm, 4),
    (P0, 0xC4, Op::Andb, Imm, 2),
    (P0, 0xC5, Op::Bitb, Imm, 2),
    (P0, 0xC6, Op::Ldab, Imm, 2),
    (P0, 0xC8, Op::Eorb, Imm, 2),
    (P0, 0xC9, Op::Adcb, Imm, 2),
    (P0, 0xCA, Op::Orab, Imm, 2),
    (P0, 0xCB, Op::Addb, Imm, 2),
    (P0, 0xCC, Op::Ldd, Imm, 3),
    (P0, 0xCE, Op::Ldx, Imm, 3),
    (P0, 0xD0, Op::Subb, Dir, 3),
    (P0, 0xD1, Op::Cmpb, Dir, 3),
    (P0, 0xD2, Op::Sbcb, Dir, 3),
    (P0, 0xD3, Op::Addd, Dir, 5),
    (P0, 0xD4, Op::Andb, Dir, 3),
    (P0, 0xD5, Op::Bitb, Dir, 3),
    (P0, 0xD6, Op::Ldab, Dir, 3),
    (P0, 0xD7, Op::Stab, Dir, 3),
    (P0, 0xD8, Op::Eorb, Dir, 3),
    (P0, 0xD9, Op::Adcb, Dir, 3),
    (P0, 0xDA, Op::Orab, Dir, 3),
    (P0, 0xDB, Op::Addb, Dir, 3),
    (P0, 0xDC, Op::Ldd, Dir, 4),
    (P0, 0xDD, Op::Std, Dir, 4),
    (P0, 0xDE, Op::Ldx, Dir, 4),
    (P0, 0xDF, Op::Stx, Dir, 4),
    (P0, 0xE0, Op::Subb, IndX, 4),
    (P0, 0xE1, Op::Cmpb, IndX, 4),
    (P0, 0xE2, Op::Sbcb, IndX, 4),
    (P0, 0xE3, Op::Addd, IndX, 6),
    (P0, 0xE4, Op::Andb, IndX, 4),
    (P0, 0xE5, Op::Bitb, IndX, 4),
    (P0, 0xE6, Op::Ldab, IndX, 4),
    (P0, 0xE7, Op::Stab, IndX, 4),
    (P0, 0xE8, Op::Eorb, IndX, 4),
    (P0, 0xE9, Op::Adcb, IndX, 4),
    (P0, 0xEA, Op::Orab, IndX, 4),
    (P0, 0xEB, Op::Addb, IndX, 4),
    (P0, 0xEC, Op::Ldd, IndX, 5),
    (P0, 0xED, Op::Std, IndX, 5),
    (P0, 0xEE, Op::Ldx, IndX, 5),
    (P0, 0xEF, Op::Stx, IndX, 5),
    (P0, 0xF0, Op::Subb, Ext, 4),
    (P0, 0xF1, Op::Cmpb, Ext, 4),
    (P0, 0xF2, Op::Sbcb, Ext, 4),
    (P0, 0xF3, Op::Addd, Ext, 6),
    (P0, 0xF4, Op::Andb, Ext, 4),
    (P0, 0xF5, Op::Bitb, Ext, 4),
    (P0, 0xF6, Op::Ldab, Ext, 4),
    (P0, 0xF7, Op::Stab, Ext, 4),
    (P0, 0xF8, Op::Eorb, Ext, 4),
    (P0, 0xF9, Op::Adcb, Ext, 4),
    (P0, 0xFA, Op::Orab, Ext, 4),
    (P0, 0xFB, Op::Addb, Ext, 4),
    (P0, 0xFC, Op::Ldd, Ext, 5),
    (P0, 0xFD, Op::Std, Ext, 5),
    (P0, 0xFE, Op::Ldx, Ext, 5),
    (P0, 0xFF, Op::Stx, Ext, 5),
    (P2, 0x08, Op::Iny, Inh, 4),
    (P2, 0x09, Op::Dey, Inh, 4),
    (P2, 0x1C, Op::Bset, IndY, 8),
    (P2, 0x1D, Op::Bclr, IndY, 8),
    (P2, 0x1E, Op::Brset, IndY, 8),
    (P2, 0x1F, Op::Brclr, IndY, 8),
    (P2, 0x30, Op::Tsy, Inh, 4),
    (P2, 0x35, Op::Tys, Inh, 4),
    (P2, 0x38, Op::Puly, Inh, 6),
    (P2, 0x3A, Op::Aby, Inh, 4),
    (P2, 0x3C, Op::Pshy, Inh, 5),
    (P2, 0x60, Op::Neg, IndY, 7),
    (P2, 0x63, Op::Com, IndY, 7),
    (P2, 0x64, Op::Lsr, IndY, 7),
    (P2, 0x66, Op::Ror, IndY, 7),
    (P2, 0x67, Op::Asr, IndY, 7),
    (P2, 0x68, Op::Asl, IndY, 7),
    (P2, 0x69, Op::Rol, IndY, 7),
    (P2, 0x6A, Op::Dec, IndY, 7),
    (P2, 0x6C, Op::Inc, IndY, 7),
    (P2, 0x6D, Op::Tst, IndY, 7),
    (P2, 0x6E, Op::Jmp, IndY, 4),
    (P2, 0x6F, Op::Clr, IndY, 7),
    (P2, 0x8C, Op::Cpy, Imm, 5),
    (P2, 0x8F, Op::Xgdy, Inh, 4),
    (P2, 0x9C, Op::Cpy, Dir, 6),
    (P2, 0xA0, Op::Suba, IndY, 5),
    (P2, 0xA1, Op::Cmpa, IndY, 5),
    (P2, 0xA2, Op::Sbca, IndY, 5),
    (P2, 0xA3, Op::Subd, IndY, 7),
    (P2, 0xA4, Op::Anda, IndY, 5),
    (P2, 0xA5, Op::Bita, IndY, 5),
    (P2, 0xA6, Op::Ldaa, IndY, 5),
    (P2, 0xA7, Op::Staa, IndY, 5),
    (P2, 0xA8, Op::Eora, IndY, 5),
    (P2, 0xA9, Op::Adca, IndY, 5),
    (P2, 0xAA, Op::Oraa, IndY, 5),
    (P2, 0xAB, Op::Adda, IndY, 5),
    (P2, 0xAC, Op::Cpy, IndY, 7),
    (P2, 0xAD, Op::Jsr, IndY, 7),
    (P2, 0xAE, Op::Lds, IndY, 6),
    (P2, 0xAF, Op::Sts, IndY, 6),
    (P2, 0xBC, Op::Cpy, Ext, 7),
    (P2, 0xCE, Op::Ldy, Imm, 4),
    (P2, 0xDE, Op::Ldy, Dir, 5),
    (P2, 0xDF, Op::Sty, Dir, 5),
    (P2, 0xE0, Op::Subb, IndY, 5),
    (P2, 0xE1, Op::Cmpb, IndY, 5),
    (P2, 0xE2, Op::Sbcb, IndY, 5),
    (P2, 0xE3, Op::Addd, IndY, 7),
    (P2, 0xE4, Op::Andb, IndY, 5),
    (P2, 0xE5, Op::Bitb, IndY, 5),
    (P2, 0xE6, Op::Ldab, IndY, 5),
    (P2, 0xE7, Op::Stab, IndY, 5),
    (P2, 0xE8, Op::Eorb, IndY, 5),
    (P2, 0xE9, Op::Adcb, IndY, 5),
    (P2, 0xEA, Op::Orab, IndY, 5),
    (P2, 0xEB, Op::Addb, IndY, 5),
    (P2, 0xEC, Op::Ldd, IndY, 6),
    (P2, 0xED, Op::Std, IndY, 6),
    (P2, 0xEE, Op::Ldy, IndY, 6),
    (P2, 0xEF, Op::Sty, IndY, 6),
    (P2, 0xFE, Op::Ldy, Ext, 6),
    (P2, 0xFF, Op::Sty, Ext, 6),
    (P3, 0x83, Op::Cpd, Imm, 5),
    (P3, 0x93, Op::Cpd, Dir, 6),
    (P3, 0xA3, Op::Cpd, IndX, 7),
    (P3, 0xAC, Op::Cpy, IndX, 7),
    (P3, 0xB3, Op::Cpd, Ext, 7),
    (P3, 0xEE, Op::Ldy, IndX, 6),
    (P3, 0xEF, Op::Sty, IndX, 6),
    (P4, 0xA3, Op::Cpd, IndY, 7),
    (P4, 0xAC, Op::Cpx, IndY, 7),
    (P4, 0xEE, Op::Ldx, IndY, 6),
    (P4, 0xEF, Op::Stx, IndY, 6),
];

/// Dense `(page, opcode)` lookup built once from [`OPCODE_TABLE`].
#[derive(Debug, Clone)]
pub struct DispatchTable {
    pages: [[Option<OpDescriptor>; 256]; 4],
}

impl DispatchTable {
    /// Builds the dense table from the row table.
    #[must_use]
    pub fn build() -> Self {
        let mut pages = [[None; 256]; 4];
        for &(page, opcode, operation, mode, cycles) in OPCODE_TABLE {
            pages[page.index()][usize::from(opcode)] = Some(OpDescriptor {
                operation,
                mode,
                cycles,
            });
        }
        Self { pages }
    }

    /// Looks up one entry. `None` means invalid opcode.
    #[must_use]
    pub fn lookup(&self, page: Page, opcode: u8) -> Option<OpDescriptor> {
        self.pages[page.index()][usize::from(opcode)]
    }
}

/// Process-wide dispatch table, built on first use.
pub fn dispatch_table() -> &'static DispatchTable {
    static TABLE: OnceLock<DispatchTable> = OnceLock::new();
    TABLE.get_or_init(DispatchTable::build)
}

/// Returns the table entry for an opcode on a page.
///
/// `None` means the opcode is unmapped on that page.
#[must_use]
pub fn classify_opcode(page: Page, opcode: u8) -> Option<OpDescriptor> {
    dispatch_table().lookup(page, opcode)
}

/// Page 0 system opcodes the core does not execute but can still name:
/// `(opcode, mnemonic, description)`.
const SYSTEM_OPCODES: &[(u8, &str, &str)] = &[
    (0x00, "TEST", "Factory test mode; not emulated."),
    (0x3E, "wai", "Wait for interrupt; not emulated."),
    (0x3F, "swi", "Software interrupt; not emulated."),
    (0xCF, "stop", "Stop internal clocks; not emulated."),
];

/// Mnemonic and description for a one-byte system opcode that has no table
/// entry. These still execute as invalid opcodes.
#[must_use]
pub fn system_mnemonic(page: Page, opcode: u8) -> Option<(&'static str, &'static str)> {
    if page != Page::Primary {
        return None;
    }
    SYSTEM_OPCODES
        .iter()
        .find(|(code, ..)| *code == opcode)
        .map(|&(_, mnemonic, description)| (mnemonic, description))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{
        classify_opcode, system_mnemonic, AddressingMode, OpDescriptor, Operation, Page,
        OPCODE_TABLE,
    };

    #[test]
    fn table_contains_unique_page_opcode_pairs() {
        let pairs: HashSet<_> = OPCODE_TABLE
            .iter()
            .map(|(page, opcode, ..)| (*page, *opcode))
            .collect();
        assert_eq!(pairs.len(), OPCODE_TABLE.len());
    }

    #[test]
    fn every_table_entry_resolves_via_lookup() {
        for &(page, opcode, operation, mode, cycles) in OPCODE_TABLE {
            assert_eq!(
                classify_opcode(page, opcode),
                Some(OpDescriptor {
                    operation,
                    mode,
                    cycles
                })
            );
        }
    }

    #[test]
    fn prefix_bytes_are_not_primary_opcodes() {
        for prefix in [0x18, 0x1A, 0xCD] {
            assert!(Page::from_prefix(prefix).is_some());
            assert_eq!(classify_opcode(Page::Primary, prefix), None);
        }
    }

    #[test]
    fn prefix_mapping_roundtrips() {
        for page in Page::ALL {
            match page.prefix() {
                Some(prefix) => assert_eq!(Page::from_prefix(prefix), Some(page)),
                None => assert_eq!(page, Page::Primary),
            }
        }
        assert_eq!(Page::from_prefix(0x00), None);
    }

    #[test]
    fn system_opcodes_are_named_but_not_executable() {
        for (opcode, mnemonic) in [(0x00, "TEST"), (0x3E, "wai"), (0x3F, "swi"), (0xCF, "stop")] {
            assert_eq!(classify_opcode(Page::Primary, opcode), None);
            assert_eq!(system_mnemonic(Page::Primary, opcode).map(|(m, _)| m), Some(mnemonic));
        }
        assert_eq!(system_mnemonic(Page::Page2, 0x3F), None);
        assert_eq!(system_mnemonic(Page::Primary, 0x41), None);
    }

    #[test]
    fn unmapped_opcodes_are_invalid() {
        for opcode in [0x87, 0xC7, 0x41, 0x65] {
            assert_eq!(classify_opcode(Page::Primary, opcode), None);
        }
        assert_eq!(classify_opcode(Page::Page2, 0x01), None);
        assert_eq!(classify_opcode(Page::Page3, 0x08), None);
        assert_eq!(classify_opcode(Page::Page4, 0x8C), None);
    }

    #[test]
    fn lookup_matches_known_encodings() {
        let ldaa = classify_opcode(Page::Primary, 0x86).expect("ldaa immediate");
        assert_eq!(ldaa.operation, Operation::Ldaa);
        assert_eq!(ldaa.mode, AddressingMode::Immediate);

        let cli = classify_opcode(Page::Primary, 0x0E).expect("cli");
        assert_eq!(cli.operation, Operation::Cli);

        let lsr_y = classify_opcode(Page::Page2, 0x64).expect("lsr indexed y");
        assert_eq!(lsr_y.operation, Operation::Lsr);
        assert_eq!(lsr_y.mode, AddressingMode::IndexedY);

        let asl_y = classify_opcode(Page::Page2, 0x68).expect("asl indexed y");
        assert_eq!(asl_y.operation, Operation::Asl);

        let ldaa_y = classify_opcode(Page::Page2, 0xA6).expect("ldaa indexed y");
        assert_eq!(ldaa_y.operation, Operation::Ldaa);

        let cpd_y = classify_opcode(Page::Page4, 0xA3).expect("cpd indexed y");
        assert_eq!(cpd_y.operation, Operation::Cpd);
        assert_eq!(cpd_y.mode, AddressingMode::IndexedY);
    }

    #[test]
    fn operand_lengths_follow_mode_and_width() {
        let ldd = classify_opcode(Page::Primary, 0xCC).expect("ldd immediate");
        assert_eq!(ldd.operand_len(), 2);

        let ldaa = classify_opcode(Page::Primary, 0x86).expect("ldaa immediate");
        assert_eq!(ldaa.operand_len(), 1);

        let brset = classify_opcode(Page::Primary, 0x12).expect("brset direct");
        assert_eq!(brset.operand_len(), 3);

        let bset = classify_opcode(Page::Page2, 0x1C).expect("bset indexed y");
        assert_eq!(bset.operand_len(), 2);

        let jmp = classify_opcode(Page::Primary, 0x7E).expect("jmp extended");
        assert_eq!(jmp.operand_len(), 2);
    }

    #[test]
    fn table_pairs_only_supported_modes() {
        for &(_, _, operation, mode, _) in OPCODE_TABLE {
            match mode {
                AddressingMode::Relative => assert!(
                    operation.summary().starts_with("Branch"),
                    "{operation:?} is not a branch"
                ),
                AddressingMode::AccumulatorA | AddressingMode::AccumulatorB => {
                    assert!(!operation.has_mask());
                }
                AddressingMode::Immediate => assert!(!operation.has_mask()),
                _ => {}
            }
            if operation.has_mask() {
                assert!(mode.is_memory() && mode != AddressingMode::Extended);
            }
        }
    }
}
