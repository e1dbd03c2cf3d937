/// `CCR` bit for carry/borrow.
pub const CCR_C: u8 = 1 << 0;
/// `CCR` bit for signed overflow.
pub const CCR_V: u8 = 1 << 1;
/// `CCR` bit for zero result.
pub const CCR_Z: u8 = 1 << 2;
/// `CCR` bit for negative result.
pub const CCR_N: u8 = 1 << 3;
/// `CCR` bit for IRQ mask.
pub const CCR_I: u8 = 1 << 4;
/// `CCR` bit for half-carry out of bit 3.
pub const CCR_H: u8 = 1 << 5;
/// `CCR` bit for XIRQ mask. Once cleared it can never be set again.
pub const CCR_X: u8 = 1 << 6;
/// `CCR` bit for stop-disable.
pub const CCR_S: u8 = 1 << 7;
/// `CCR` value after reset (`S`, `X` and `I` set).
pub const CCR_RESET: u8 = CCR_S | CCR_X | CCR_I;

/// Programmer-visible register file of the 68HC11 plus the cycle counter.
///
/// `D` is stored as one 16-bit word; `A` is its high byte and `B` its low byte.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Registers {
    d: u16,
    x: u16,
    y: u16,
    sp: u16,
    pc: u16,
    ccr: u8,
    cycles: u64,
    last_pc: u16,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            d: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: 0,
            ccr: CCR_RESET,
            cycles: 0,
            last_pc: 0,
        }
    }
}

impl Registers {
    /// Reads accumulator `A` (high byte of `D`).
    #[must_use]
    pub const fn a(&self) -> u8 {
        self.d.to_be_bytes()[0]
    }

    /// Writes accumulator `A`, leaving `B` untouched.
    pub const fn set_a(&mut self, value: u8) {
        self.d = u16::from_be_bytes([value, self.b()]);
    }

    /// Reads accumulator `B` (low byte of `D`).
    #[must_use]
    pub const fn b(&self) -> u8 {
        self.d.to_be_bytes()[1]
    }

    /// Writes accumulator `B`, leaving `A` untouched.
    pub const fn set_b(&mut self, value: u8) {
        self.d = u16::from_be_bytes([self.a(), value]);
    }

    /// Reads the double accumulator `D`.
    #[must_use]
    pub const fn d(&self) -> u16 {
        self.d
    }

    /// Writes the double accumulator `D`.
    pub const fn set_d(&mut self, value: u16) {
        self.d = value;
    }

    /// Reads index register `X`.
    #[must_use]
    pub const fn x(&self) -> u16 {
        self.x
    }

    /// Writes index register `X`.
    pub const fn set_x(&mut self, value: u16) {
        self.x = value;
    }

    /// Reads index register `Y`.
    #[must_use]
    pub const fn y(&self) -> u16 {
        self.y
    }

    /// Writes index register `Y`.
    pub const fn set_y(&mut self, value: u16) {
        self.y = value;
    }

    /// Reads the stack pointer.
    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.sp
    }

    /// Writes the stack pointer.
    pub const fn set_sp(&mut self, value: u16) {
        self.sp = value;
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    /// Reads the condition code register.
    #[must_use]
    pub const fn ccr(&self) -> u8 {
        self.ccr
    }

    /// Replaces the condition code register.
    ///
    /// When `X` is already clear the incoming `X` bit is discarded, so `X` can
    /// only ever go from set to clear.
    pub const fn set_ccr(&mut self, value: u8) {
        if self.ccr & CCR_X == 0 {
            self.ccr = value & !CCR_X;
        } else {
            self.ccr = value;
        }
    }

    /// ORs `bits` into the CCR. `X` is masked off and never set here.
    pub const fn set_ccr_bits(&mut self, bits: u8) {
        self.ccr |= bits & !CCR_X;
    }

    /// Clears every CCR bit that is set in `bits`.
    pub const fn clear_ccr_bits(&mut self, bits: u8) {
        self.ccr &= !bits;
    }

    /// Returns `true` when every bit of `flag` is set in the CCR.
    #[must_use]
    pub const fn flag_is_set(&self, flag: u8) -> bool {
        (self.ccr & flag) == flag
    }

    /// Sets or clears a CCR flag through the masked set/clear paths.
    pub const fn set_flag(&mut self, flag: u8, enabled: bool) {
        if enabled {
            self.set_ccr_bits(flag);
        } else {
            self.clear_ccr_bits(flag);
        }
    }

    /// Total cycles charged since reset.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Charges `cycles` to the cycle counter.
    pub const fn add_cycles(&mut self, cycles: u64) {
        self.cycles = self.cycles.wrapping_add(cycles);
    }

    /// Address of the instruction currently (or most recently) executing.
    #[must_use]
    pub const fn last_pc(&self) -> u16 {
        self.last_pc
    }

    /// Latches the start address of the instruction about to execute.
    pub const fn set_last_pc(&mut self, value: u16) {
        self.last_pc = value;
    }
}
