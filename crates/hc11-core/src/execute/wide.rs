//! 16-bit register, multiply and divide semantics.

use super::flags::{
    add16, normalize16, sub16, update_logic16, update_nz16, update_shift_overflow,
};
use super::helpers::{load16, store16, Operand};
use crate::api::CoreState;
use crate::state::{CCR_C, CCR_V, CCR_Z};

/// 16-bit register selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wide {
    /// Double accumulator `D`.
    D,
    /// Index register `X`.
    X,
    /// Index register `Y`.
    Y,
    /// Stack pointer.
    Sp,
}

impl Wide {
    const fn get(self, state: &CoreState) -> u16 {
        match self {
            Self::D => state.regs.d(),
            Self::X => state.regs.x(),
            Self::Y => state.regs.y(),
            Self::Sp => state.regs.sp(),
        }
    }

    const fn set(self, state: &mut CoreState, value: u16) {
        match self {
            Self::D => state.regs.set_d(value),
            Self::X => state.regs.set_x(value),
            Self::Y => state.regs.set_y(value),
            Self::Sp => state.regs.set_sp(value),
        }
    }
}

/// `addd`.
pub fn add_d(state: &mut CoreState, operand: Operand) {
    let rhs = load16(state, operand);
    let lhs = state.regs.d();
    let result = add16(&mut state.regs, lhs, rhs);
    state.regs.set_d(result);
}

/// `subd`.
pub fn sub_d(state: &mut CoreState, operand: Operand) {
    let rhs = load16(state, operand);
    let lhs = state.regs.d();
    let result = sub16(&mut state.regs, lhs, rhs);
    state.regs.set_d(result);
}

/// `cpd`, `cpx`, `cpy`.
pub fn compare(state: &mut CoreState, reg: Wide, operand: Operand) {
    let rhs = load16(state, operand);
    let lhs = reg.get(state);
    sub16(&mut state.regs, lhs, rhs);
}

/// `ldd`, `ldx`, `ldy`, `lds`.
pub fn load(state: &mut CoreState, reg: Wide, operand: Operand) {
    let value = load16(state, operand);
    update_logic16(&mut state.regs, value);
    reg.set(state, value);
}

/// `std`, `stx`, `sty`, `sts`.
pub fn store(state: &mut CoreState, reg: Wide, operand: Operand) {
    let value = reg.get(state);
    update_logic16(&mut state.regs, value);
    store16(state, operand, value);
}

/// `inx`/`dex`/`iny`/`dey` (Z only) and `ins`/`des` (no flags).
pub fn step_register(state: &mut CoreState, reg: Wide, delta: i32) {
    let value = normalize16(i32::from(reg.get(state)) + delta);
    reg.set(state, value);
    if reg != Wide::Sp {
        state.regs.set_flag(CCR_Z, value == 0);
    }
}

/// `abx`/`aby`: unsigned `B` added to the index register, no flags.
pub fn add_b_to(state: &mut CoreState, reg: Wide) {
    let value = normalize16(i32::from(reg.get(state)) + i32::from(state.regs.b()));
    reg.set(state, value);
}

/// `xgdx`/`xgdy`.
pub fn exchange_d(state: &mut CoreState, reg: Wide) {
    let d = state.regs.d();
    let other = reg.get(state);
    state.regs.set_d(other);
    reg.set(state, d);
}

/// `lsrd`: zero into bit 15, bit 0 into carry.
pub fn shift_right_d(state: &mut CoreState) {
    let value = state.regs.d();
    let result = value >> 1;
    update_nz16(&mut state.regs, result);
    state.regs.set_flag(CCR_C, value & 0x0001 != 0);
    update_shift_overflow(&mut state.regs);
    state.regs.set_d(result);
}

/// `asld`: zero into bit 0, bit 15 into carry.
pub fn shift_left_d(state: &mut CoreState) {
    let value = state.regs.d();
    let result = value << 1;
    update_nz16(&mut state.regs, result);
    state.regs.set_flag(CCR_C, value & 0x8000 != 0);
    update_shift_overflow(&mut state.regs);
    state.regs.set_d(result);
}

/// `mul`: `D = A * B`, carry from bit 7 of the result for rounding.
pub fn multiply(state: &mut CoreState) {
    let result = u16::from(state.regs.a()) * u16::from(state.regs.b());
    state.regs.set_d(result);
    state.regs.set_flag(CCR_C, result & 0x0080 != 0);
}

/// Divide-by-zero fallback shared by `idiv` and `fdiv`: quotient 0 in `X`,
/// remainder equal to the dividend, so `D` is left as it was.
fn divide_by_zero(state: &mut CoreState) {
    let remainder = state.regs.d();
    state.regs.set_x(0);
    state.regs.set_flag(CCR_Z, true);
    state.regs.set_flag(CCR_C, remainder != 0);
}

/// `idiv`: `X = D / X`, `D = D % X`.
pub fn integer_divide(state: &mut CoreState) {
    let dividend = state.regs.d();
    let divisor = state.regs.x();
    state.regs.set_flag(CCR_V, false);

    if divisor == 0 {
        divide_by_zero(state);
        return;
    }

    let quotient = dividend / divisor;
    let remainder = dividend % divisor;
    state.regs.set_x(quotient);
    state.regs.set_d(remainder);
    state.regs.set_flag(CCR_Z, quotient == 0);
    state.regs.set_flag(CCR_C, remainder != 0);
}

/// `fdiv`: `X = (D << 16) / X`, `D` = remainder. `V` flags a quotient that
/// does not fit 16 bits (divisor not greater than dividend).
pub fn fractional_divide(state: &mut CoreState) {
    let dividend = u32::from(state.regs.d()) << 16;
    let divisor = u32::from(state.regs.x());

    if divisor == 0 {
        divide_by_zero(state);
        return;
    }

    let quotient = dividend / divisor;
    let remainder = dividend % divisor;
    let [_, _, q_high, q_low] = quotient.to_be_bytes();
    let [_, _, r_high, r_low] = remainder.to_be_bytes();
    let quotient16 = u16::from_be_bytes([q_high, q_low]);

    state.regs.set_flag(CCR_V, quotient > 0xFFFF);
    state.regs.set_x(quotient16);
    state.regs.set_d(u16::from_be_bytes([r_high, r_low]));
    state.regs.set_flag(CCR_Z, quotient16 == 0);
    state.regs.set_flag(CCR_C, remainder != 0);
}
