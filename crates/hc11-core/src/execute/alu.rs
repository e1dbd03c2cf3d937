//! 8-bit accumulator and read-modify-write semantics.

use super::flags::{add8, normalize8, sub8, update_logic8, update_nz8, update_shift_overflow};
use super::helpers::{load8, store8, Operand};
use crate::api::CoreState;
use crate::state::{CCR_C, CCR_V};

/// Accumulator selector for the `a`/`b` instruction pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acc {
    /// Accumulator `A`.
    A,
    /// Accumulator `B`.
    B,
}

impl Acc {
    const fn get(self, state: &CoreState) -> u8 {
        match self {
            Self::A => state.regs.a(),
            Self::B => state.regs.b(),
        }
    }

    const fn set(self, state: &mut CoreState, value: u8) {
        match self {
            Self::A => state.regs.set_a(value),
            Self::B => state.regs.set_b(value),
        }
    }
}

/// Two-operand accumulator operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccOp {
    Add,
    AddCarry,
    Sub,
    SubCarry,
    Compare,
    And,
    BitTest,
    Or,
    Xor,
    Load,
}

/// `acc <op> operand`, storing the result unless the op only sets flags.
pub fn accumulate(state: &mut CoreState, acc: Acc, op: AccOp, operand: Operand) {
    let lhs = acc.get(state);
    let rhs = load8(state, operand);
    let carry = state.regs.flag_is_set(CCR_C);
    let regs = &mut state.regs;

    let result = match op {
        AccOp::Add => Some(add8(regs, lhs, rhs, false)),
        AccOp::AddCarry => Some(add8(regs, lhs, rhs, carry)),
        AccOp::Sub => Some(sub8(regs, lhs, rhs, false)),
        AccOp::SubCarry => Some(sub8(regs, lhs, rhs, carry)),
        AccOp::Compare => {
            sub8(regs, lhs, rhs, false);
            None
        }
        AccOp::And => {
            update_logic8(regs, lhs & rhs);
            Some(lhs & rhs)
        }
        AccOp::BitTest => {
            update_logic8(regs, lhs & rhs);
            None
        }
        AccOp::Or => {
            update_logic8(regs, lhs | rhs);
            Some(lhs | rhs)
        }
        AccOp::Xor => {
            update_logic8(regs, lhs ^ rhs);
            Some(lhs ^ rhs)
        }
        AccOp::Load => {
            update_logic8(regs, rhs);
            Some(rhs)
        }
    };

    if let Some(value) = result {
        acc.set(state, value);
    }
}

/// `staa`/`stab`.
pub fn store_acc(state: &mut CoreState, acc: Acc, operand: Operand) {
    let value = acc.get(state);
    update_logic8(&mut state.regs, value);
    store8(state, operand, value);
}

/// Single-operand read-modify-write operations on an accumulator or memory byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
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
    Clr,
}

/// Applies `op` to the operand in place.
pub fn unary(state: &mut CoreState, op: UnaryOp, operand: Operand) {
    let value = if op == UnaryOp::Clr {
        0
    } else {
        load8(state, operand)
    };
    let carry_in = u8::from(state.regs.flag_is_set(CCR_C));
    let regs = &mut state.regs;

    let result = match op {
        UnaryOp::Neg => Some(sub8(regs, 0, value, false)),
        UnaryOp::Com => {
            let result = !value;
            update_logic8(regs, result);
            regs.set_flag(CCR_C, true);
            Some(result)
        }
        UnaryOp::Lsr => {
            let result = value >> 1;
            update_nz8(regs, result);
            regs.set_flag(CCR_C, value & 0x01 != 0);
            update_shift_overflow(regs);
            Some(result)
        }
        UnaryOp::Ror => {
            let result = (value >> 1) | (carry_in << 7);
            update_nz8(regs, result);
            regs.set_flag(CCR_C, value & 0x01 != 0);
            update_shift_overflow(regs);
            Some(result)
        }
        UnaryOp::Asr => {
            let result = (value >> 1) | (value & 0x80);
            update_nz8(regs, result);
            regs.set_flag(CCR_C, value & 0x01 != 0);
            update_shift_overflow(regs);
            Some(result)
        }
        UnaryOp::Asl => {
            let result = value << 1;
            update_nz8(regs, result);
            regs.set_flag(CCR_C, value & 0x80 != 0);
            update_shift_overflow(regs);
            Some(result)
        }
        UnaryOp::Rol => {
            let result = (value << 1) | carry_in;
            update_nz8(regs, result);
            regs.set_flag(CCR_C, value & 0x80 != 0);
            update_shift_overflow(regs);
            Some(result)
        }
        UnaryOp::Dec => {
            let result = normalize8(i32::from(value) - 1);
            update_nz8(regs, result);
            regs.set_flag(CCR_V, value == 0x80);
            Some(result)
        }
        UnaryOp::Inc => {
            let result = normalize8(i32::from(value) + 1);
            update_nz8(regs, result);
            regs.set_flag(CCR_V, value == 0x7F);
            Some(result)
        }
        UnaryOp::Tst => {
            update_logic8(regs, value);
            regs.set_flag(CCR_C, false);
            None
        }
        UnaryOp::Clr => {
            update_logic8(regs, 0);
            regs.set_flag(CCR_C, false);
            Some(0)
        }
    };

    if let Some(value) = result {
        store8(state, operand, value);
    }
}

/// `aba`, `sba` and `cba`.
pub fn accumulator_pair(state: &mut CoreState, op: AccOp) {
    let b = state.regs.b();
    accumulate(state, Acc::A, op, Operand::Imm8(b));
}

/// `tab` and `tba`.
pub fn transfer(state: &mut CoreState, from: Acc, to: Acc) {
    let value = from.get(state);
    update_logic8(&mut state.regs, value);
    to.set(state, value);
}

/// `bset`/`bclr`: read-modify-write of the masked bits.
pub fn bit_update(state: &mut CoreState, operand: Operand, mask: u8, set: bool) {
    let value = load8(state, operand);
    let result = if set { value | mask } else { value & !mask };
    update_logic8(&mut state.regs, result);
    store8(state, operand, result);
}

/// `brset`/`brclr` condition: all mask bits set, or all mask bits clear.
pub fn bit_test(state: &mut CoreState, operand: Operand, mask: u8, want_set: bool) -> bool {
    let value = load8(state, operand);
    if want_set {
        value & mask == mask
    } else {
        value & mask == 0
    }
}

/// Decimal adjust after BCD addition.
///
/// Accumulator values at or above `0x9A`, or a set carry, add `0x66` and set
/// both `C` and `V`; otherwise `C` and `V` are cleared. A low nibble above 9 is
/// then corrected by 6. The result is kept to 8 bits.
pub fn decimal_adjust(state: &mut CoreState) {
    let regs = &mut state.regs;
    let mut value = i32::from(regs.a());

    if regs.flag_is_set(CCR_C) || value >= 0x9A {
        value = (value + 0x66) & 0xFF;
        regs.set_flag(CCR_C, true);
        regs.set_flag(CCR_V, true);
        if value & 0x0F > 9 {
            value -= 6;
        }
    } else {
        regs.set_flag(CCR_C, false);
        regs.set_flag(CCR_V, false);
    }
    if value & 0x0F > 9 {
        value += 6;
    }

    let result = normalize8(value);
    update_nz8(regs, result);
    regs.set_a(result);
}
