//! Branches, jumps, subroutine linkage, stack transfers and CCR operations.
//!
//! Every routine here runs after `PC` has already been advanced past the
//! instruction, so relative targets are computed from the next instruction.

use super::helpers::{pull16, pull8, push16, push8, relative_target, Operand};
use crate::api::CoreState;
use crate::encoding::Operation;
use crate::state::{CCR_C, CCR_N, CCR_V, CCR_Z};

/// Evaluates the predicate of a conditional branch against the CCR.
///
/// Returns `None` for operations that are not relative branches.
#[must_use]
pub fn branch_condition(operation: Operation, ccr: u8) -> Option<bool> {
    let c = ccr & CCR_C != 0;
    let v = ccr & CCR_V != 0;
    let z = ccr & CCR_Z != 0;
    let n = ccr & CCR_N != 0;

    let taken = match operation {
        Operation::Bra | Operation::Bsr => true,
        Operation::Brn => false,
        Operation::Bhi => !(c || z),
        Operation::Bls => c || z,
        Operation::Bcc => !c,
        Operation::Bcs => c,
        Operation::Bne => !z,
        Operation::Beq => z,
        Operation::Bvc => !v,
        Operation::Bvs => v,
        Operation::Bpl => !n,
        Operation::Bmi => n,
        Operation::Bge => n == v,
        Operation::Blt => n != v,
        Operation::Bgt => !z && n == v,
        Operation::Ble => z || n != v,
        _ => return None,
    };
    Some(taken)
}

/// Takes a relative branch from the current (already advanced) `PC`.
pub fn branch(state: &mut CoreState, offset: i8) {
    let target = relative_target(state.regs.pc(), offset);
    state.regs.set_pc(target);
}

/// `jmp`.
pub const fn jump(state: &mut CoreState, operand: Operand) {
    if let Operand::Address(target) = operand {
        state.regs.set_pc(target);
    }
}

/// `jsr`: push the return address, then jump to the effective address.
pub fn jump_subroutine(state: &mut CoreState, operand: Operand) {
    if let Operand::Address(target) = operand {
        let ret = state.regs.pc();
        push16(state, ret);
        state.regs.set_pc(target);
    }
}

/// `bsr`: push the return address, then branch.
pub fn branch_subroutine(state: &mut CoreState, offset: i8) {
    let ret = state.regs.pc();
    push16(state, ret);
    branch(state, offset);
}

/// `rts`.
pub fn return_subroutine(state: &mut CoreState) {
    let target = pull16(state);
    state.regs.set_pc(target);
}

/// `rti`: pull CCR, B, A, X, Y and PC in that order.
pub fn return_interrupt(state: &mut CoreState) {
    let ccr = pull8(state);
    state.regs.set_ccr(ccr);
    let b = pull8(state);
    state.regs.set_b(b);
    let a = pull8(state);
    state.regs.set_a(a);
    let x = pull16(state);
    state.regs.set_x(x);
    let y = pull16(state);
    state.regs.set_y(y);
    let pc = pull16(state);
    state.regs.set_pc(pc);
}

/// Stack and CCR transfers that take no operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    PushA,
    PushB,
    PushX,
    PushY,
    PullA,
    PullB,
    PullX,
    PullY,
    SpToX,
    SpToY,
    XToSp,
    YToSp,
    AToCcr,
    CcrToA,
}

/// Executes one stack/CCR transfer.
pub fn transfer(state: &mut CoreState, kind: Transfer) {
    match kind {
        Transfer::PushA => {
            let value = state.regs.a();
            push8(state, value);
        }
        Transfer::PushB => {
            let value = state.regs.b();
            push8(state, value);
        }
        Transfer::PushX => {
            let value = state.regs.x();
            push16(state, value);
        }
        Transfer::PushY => {
            let value = state.regs.y();
            push16(state, value);
        }
        Transfer::PullA => {
            let value = pull8(state);
            state.regs.set_a(value);
        }
        Transfer::PullB => {
            let value = pull8(state);
            state.regs.set_b(value);
        }
        Transfer::PullX => {
            let value = pull16(state);
            state.regs.set_x(value);
        }
        Transfer::PullY => {
            let value = pull16(state);
            state.regs.set_y(value);
        }
        Transfer::SpToX => state.regs.set_x(state.regs.sp().wrapping_add(1)),
        Transfer::SpToY => state.regs.set_y(state.regs.sp().wrapping_add(1)),
        Transfer::XToSp => state.regs.set_sp(state.regs.x().wrapping_sub(1)),
        Transfer::YToSp => state.regs.set_sp(state.regs.y().wrapping_sub(1)),
        Transfer::AToCcr => state.regs.set_ccr(state.regs.a()),
        Transfer::CcrToA => state.regs.set_a(state.regs.ccr()),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{
        branch_condition, jump_subroutine, return_interrupt, return_subroutine, transfer,
        Transfer,
    };
    use crate::api::CoreState;
    use crate::encoding::Operation;
    use crate::execute::helpers::{push16, push8, relative_target, Operand};
    use crate::state::{CCR_C, CCR_N, CCR_V, CCR_X, CCR_Z};

    #[rstest]
    #[case(Operation::Bhi, 0, true)]
    #[case(Operation::Bhi, CCR_Z, false)]
    #[case(Operation::Bls, CCR_C, true)]
    #[case(Operation::Bmi, CCR_N, true)]
    #[case(Operation::Bmi, 0, false)]
    #[case(Operation::Bge, CCR_N | CCR_V, true)]
    #[case(Operation::Blt, CCR_N, true)]
    #[case(Operation::Bgt, 0, true)]
    #[case(Operation::Bgt, CCR_Z, false)]
    #[case(Operation::Bgt, CCR_V, false)]
    #[case(Operation::Ble, CCR_N, true)]
    #[case(Operation::Ble, 0, false)]
    #[case(Operation::Brn, 0xFF, false)]
    fn branch_predicates(#[case] operation: Operation, #[case] ccr: u8, #[case] taken: bool) {
        assert_eq!(branch_condition(operation, ccr), Some(taken));
    }

    #[test]
    fn non_branches_have_no_predicate() {
        assert_eq!(branch_condition(Operation::Ldaa, 0), None);
    }

    #[test]
    fn subroutine_round_trip_restores_pc_and_sp() {
        let mut state = CoreState::default();
        state.regs.set_sp(0x00FF);
        state.regs.set_pc(0x1003);
        jump_subroutine(&mut state, Operand::Address(0x2000));
        assert_eq!(state.regs.pc(), 0x2000);
        assert_eq!(state.regs.sp(), 0x00FD);
        return_subroutine(&mut state);
        assert_eq!(state.regs.pc(), 0x1003);
        assert_eq!(state.regs.sp(), 0x00FF);
    }

    #[test]
    fn return_from_interrupt_pulls_full_frame() {
        let mut state = CoreState::default();
        state.regs.set_sp(0x00FF);
        push16(&mut state, 0x4000);
        push16(&mut state, 0x2222);
        push16(&mut state, 0x1111);
        push8(&mut state, 0xAA);
        push8(&mut state, 0xBB);
        push8(&mut state, 0x00);

        return_interrupt(&mut state);
        assert_eq!(state.regs.pc(), 0x4000);
        assert_eq!(state.regs.y(), 0x2222);
        assert_eq!(state.regs.x(), 0x1111);
        assert_eq!(state.regs.a(), 0xAA);
        assert_eq!(state.regs.b(), 0xBB);
        assert_eq!(state.regs.ccr() & CCR_X, 0);
        assert_eq!(state.regs.sp(), 0x00FF);
    }

    #[test]
    fn stack_pointer_transfers_offset_by_one() {
        let mut state = CoreState::default();
        state.regs.set_sp(0x01FF);
        transfer(&mut state, Transfer::SpToX);
        assert_eq!(state.regs.x(), 0x0200);
        transfer(&mut state, Transfer::XToSp);
        assert_eq!(state.regs.sp(), 0x01FF);
    }

    #[test]
    fn tap_cannot_set_x_once_cleared() {
        let mut state = CoreState::default();
        state.regs.set_a(0x00);
        transfer(&mut state, Transfer::AToCcr);
        state.regs.set_a(0xFF);
        transfer(&mut state, Transfer::AToCcr);
        assert_eq!(state.regs.ccr(), 0xBF);
        transfer(&mut state, Transfer::CcrToA);
        assert_eq!(state.regs.a(), 0xBF);
    }

    proptest! {
        #[test]
        fn branch_target_is_next_plus_signed_offset(pc in any::<u16>(), offset in any::<i8>()) {
            let expected = (i32::from(pc) + i32::from(offset)).rem_euclid(0x1_0000);
            prop_assert_eq!(i32::from(relative_target(pc, offset)), expected);
        }
    }
}
