//! CCR update building blocks shared by the instruction routines.
//!
//! Arithmetic is carried out on widened signed values and folded back into
//! range by adding or subtracting 256/65536, so carry and borrow are read off
//! the raw result before it is normalized.

use crate::state::{Registers, CCR_C, CCR_H, CCR_N, CCR_V, CCR_Z};

/// Folds a raw 8-bit arithmetic result back into `0..=255`.
#[must_use]
pub fn normalize8(raw: i32) -> u8 {
    let mut value = raw;
    while value < 0 {
        value += 0x100;
    }
    while value > 0xFF {
        value -= 0x100;
    }
    u8::try_from(value).unwrap_or_default()
}

/// Folds a raw 16-bit arithmetic result back into `0..=65535`.
#[must_use]
pub fn normalize16(raw: i32) -> u16 {
    let mut value = raw;
    while value < 0 {
        value += 0x1_0000;
    }
    while value > 0xFFFF {
        value -= 0x1_0000;
    }
    u16::try_from(value).unwrap_or_default()
}

/// Z iff zero, N iff bit 7 set.
pub const fn update_nz8(regs: &mut Registers, value: u8) {
    regs.set_flag(CCR_Z, value == 0);
    regs.set_flag(CCR_N, value & 0x80 != 0);
}

/// Z iff zero, N iff bit 15 set.
pub const fn update_nz16(regs: &mut Registers, value: u16) {
    regs.set_flag(CCR_Z, value == 0);
    regs.set_flag(CCR_N, value & 0x8000 != 0);
}

/// Loads, stores and logic ops: N/Z from the value, V cleared.
pub const fn update_logic8(regs: &mut Registers, value: u8) {
    update_nz8(regs, value);
    regs.set_flag(CCR_V, false);
}

/// 16-bit loads and stores: N/Z from the value, V cleared.
pub const fn update_logic16(regs: &mut Registers, value: u16) {
    update_nz16(regs, value);
    regs.set_flag(CCR_V, false);
}

/// Shift/rotate family: V = N xor C, evaluated after N and C are final.
pub const fn update_shift_overflow(regs: &mut Registers) {
    let n = regs.flag_is_set(CCR_N);
    let c = regs.flag_is_set(CCR_C);
    regs.set_flag(CCR_V, n != c);
}

/// 8-bit add with optional carry in. Updates H, N, Z, V, C.
pub fn add8(regs: &mut Registers, lhs: u8, rhs: u8, carry_in: bool) -> u8 {
    let carry = i32::from(carry_in);
    let raw = i32::from(lhs) + i32::from(rhs) + carry;
    let result = normalize8(raw);

    regs.set_flag(CCR_H, i32::from(lhs & 0x0F) + i32::from(rhs & 0x0F) + carry > 0x0F);
    regs.set_flag(CCR_C, raw > 0xFF);
    regs.set_flag(
        CCR_V,
        (lhs & 0x80) == (rhs & 0x80) && (result & 0x80) != (lhs & 0x80),
    );
    update_nz8(regs, result);
    result
}

/// 8-bit subtract `lhs - rhs - borrow_in`. Updates N, Z, V, C.
pub fn sub8(regs: &mut Registers, lhs: u8, rhs: u8, borrow_in: bool) -> u8 {
    let raw = i32::from(lhs) - i32::from(rhs) - i32::from(borrow_in);
    let result = normalize8(raw);

    regs.set_flag(CCR_C, raw < 0);
    regs.set_flag(
        CCR_V,
        (lhs & 0x80) != (rhs & 0x80) && (rhs & 0x80) == (result & 0x80),
    );
    update_nz8(regs, result);
    result
}

/// 16-bit add. Updates N, Z, V, C.
pub fn add16(regs: &mut Registers, lhs: u16, rhs: u16) -> u16 {
    let raw = i32::from(lhs) + i32::from(rhs);
    let result = normalize16(raw);

    regs.set_flag(CCR_C, raw > 0xFFFF);
    regs.set_flag(
        CCR_V,
        (lhs & 0x8000) == (rhs & 0x8000) && (result & 0x8000) != (lhs & 0x8000),
    );
    update_nz16(regs, result);
    result
}

/// 16-bit subtract `lhs - rhs`. Updates N, Z, V, C.
pub fn sub16(regs: &mut Registers, lhs: u16, rhs: u16) -> u16 {
    let raw = i32::from(lhs) - i32::from(rhs);
    let result = normalize16(raw);

    regs.set_flag(CCR_C, raw < 0);
    regs.set_flag(
        CCR_V,
        (lhs & 0x8000) != (rhs & 0x8000) && (rhs & 0x8000) == (result & 0x8000),
    );
    update_nz16(regs, result);
    result
}
