//! Instruction execution for the 68HC11 core.
//!
//! One call to [`step_one`] runs a single instruction:
//! 1. Latch `last_pc` and decode the prefix/opcode silently
//! 2. Resolve operand bytes from the instruction stream (silent reads)
//! 3. Advance `PC` past the instruction
//! 4. Run the semantics; data and stack accesses go through the trapped path
//! 5. Charge the fixed cycle cost from the opcode table
//!
//! Unmapped opcodes retire as a two-cycle no-op and report a fault.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::too_many_lines,
    unknown_lints,
    missing_docs
)]

mod alu;
mod control;
mod flags;
mod helpers;
mod wide;

pub use control::branch_condition;
pub use flags::{normalize16, normalize8};
pub use helpers::{relative_target, Operand, Operands};

use alu::{Acc, AccOp, UnaryOp};
use control::Transfer;
use helpers::resolve_operands;
use wide::Wide;

use crate::api::CoreState;
use crate::decoder::decode_at;
use crate::encoding::{OpDescriptor, Operation};
use crate::fault::Fault;
use crate::state::{CCR_C, CCR_I, CCR_V};
use crate::timing::INVALID_OPCODE_CYCLES;

/// Outcome of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Instruction retired with its fixed cycle cost.
    Retired {
        /// Cycles charged.
        cycles: u8,
    },
    /// Unmapped opcode executed as a no-op.
    InvalidOpcode {
        /// Diagnostic naming the byte, page and address.
        fault: Fault,
        /// Cycles charged.
        cycles: u8,
    },
}

impl ExecuteOutcome {
    /// Cycles charged by this instruction.
    #[must_use]
    pub const fn cycles(self) -> u8 {
        match self {
            Self::Retired { cycles } | Self::InvalidOpcode { cycles, .. } => cycles,
        }
    }
}

/// Executes the instruction at `PC`.
pub fn step_one(state: &mut CoreState) -> ExecuteOutcome {
    let pc = state.regs.pc();
    state.regs.set_last_pc(pc);

    let fetched = decode_at(&state.memory, pc);
    let next_pc = pc.wrapping_add(u16::from(fetched.size()));

    let descriptor = match fetched.descriptor_or_fault() {
        Ok(descriptor) => descriptor,
        Err(fault) => {
            fault.report();
            state.regs.set_pc(next_pc);
            state.regs.add_cycles(u64::from(INVALID_OPCODE_CYCLES));
            return ExecuteOutcome::InvalidOpcode {
                fault,
                cycles: INVALID_OPCODE_CYCLES,
            };
        }
    };

    let operands = resolve_operands(state, &fetched, descriptor);
    state.regs.set_pc(next_pc);
    execute_operation(state, descriptor, operands);
    state.regs.add_cycles(u64::from(descriptor.cycles));

    ExecuteOutcome::Retired {
        cycles: descriptor.cycles,
    }
}

fn execute_operation(state: &mut CoreState, descriptor: OpDescriptor, operands: Operands) {
    let operand = operands.operand;

    match descriptor.operation {
        Operation::Nop => {}

        Operation::Adda => alu::accumulate(state, Acc::A, AccOp::Add, operand),
        Operation::Addb => alu::accumulate(state, Acc::B, AccOp::Add, operand),
        Operation::Adca => alu::accumulate(state, Acc::A, AccOp::AddCarry, operand),
        Operation::Adcb => alu::accumulate(state, Acc::B, AccOp::AddCarry, operand),
        Operation::Suba => alu::accumulate(state, Acc::A, AccOp::Sub, operand),
        Operation::Subb => alu::accumulate(state, Acc::B, AccOp::Sub, operand),
        Operation::Sbca => alu::accumulate(state, Acc::A, AccOp::SubCarry, operand),
        Operation::Sbcb => alu::accumulate(state, Acc::B, AccOp::SubCarry, operand),
        Operation::Cmpa => alu::accumulate(state, Acc::A, AccOp::Compare, operand),
        Operation::Cmpb => alu::accumulate(state, Acc::B, AccOp::Compare, operand),
        Operation::Anda => alu::accumulate(state, Acc::A, AccOp::And, operand),
        Operation::Andb => alu::accumulate(state, Acc::B, AccOp::And, operand),
        Operation::Bita => alu::accumulate(state, Acc::A, AccOp::BitTest, operand),
        Operation::Bitb => alu::accumulate(state, Acc::B, AccOp::BitTest, operand),
        Operation::Oraa => alu::accumulate(state, Acc::A, AccOp::Or, operand),
        Operation::Orab => alu::accumulate(state, Acc::B, AccOp::Or, operand),
        Operation::Eora => alu::accumulate(state, Acc::A, AccOp::Xor, operand),
        Operation::Eorb => alu::accumulate(state, Acc::B, AccOp::Xor, operand),
        Operation::Ldaa => alu::accumulate(state, Acc::A, AccOp::Load, operand),
        Operation::Ldab => alu::accumulate(state, Acc::B, AccOp::Load, operand),
        Operation::Staa => alu::store_acc(state, Acc::A, operand),
        Operation::Stab => alu::store_acc(state, Acc::B, operand),

        Operation::Aba => alu::accumulator_pair(state, AccOp::Add),
        Operation::Sba => alu::accumulator_pair(state, AccOp::Sub),
        Operation::Cba => alu::accumulator_pair(state, AccOp::Compare),
        Operation::Tab => alu::transfer(state, Acc::A, Acc::B),
        Operation::Tba => alu::transfer(state, Acc::B, Acc::A),
        Operation::Daa => alu::decimal_adjust(state),

        Operation::Neg => alu::unary(state, UnaryOp::Neg, operand),
        Operation::Com => alu::unary(state, UnaryOp::Com, operand),
        Operation::Lsr => alu::unary(state, UnaryOp::Lsr, operand),
        Operation::Ror => alu::unary(state, UnaryOp::Ror, operand),
        Operation::Asr => alu::unary(state, UnaryOp::Asr, operand),
        Operation::Asl => alu::unary(state, UnaryOp::Asl, operand),
        Operation::Rol => alu::unary(state, UnaryOp::Rol, operand),
        Operation::Dec => alu::unary(state, UnaryOp::Dec, operand),
        Operation::Inc => alu::unary(state, UnaryOp::Inc, operand),
        Operation::Tst => alu::unary(state, UnaryOp::Tst, operand),
        Operation::Clr => alu::unary(state, UnaryOp::Clr, operand),

        Operation::Bset => alu::bit_update(state, operand, operands.mask, true),
        Operation::Bclr => alu::bit_update(state, operand, operands.mask, false),
        Operation::Brset => {
            if alu::bit_test(state, operand, operands.mask, true) {
                control::branch(state, operands.offset);
            }
        }
        Operation::Brclr => {
            if alu::bit_test(state, operand, operands.mask, false) {
                control::branch(state, operands.offset);
            }
        }

        Operation::Addd => wide::add_d(state, operand),
        Operation::Subd => wide::sub_d(state, operand),
        Operation::Cpd => wide::compare(state, Wide::D, operand),
        Operation::Cpx => wide::compare(state, Wide::X, operand),
        Operation::Cpy => wide::compare(state, Wide::Y, operand),
        Operation::Ldd => wide::load(state, Wide::D, operand),
        Operation::Ldx => wide::load(state, Wide::X, operand),
        Operation::Ldy => wide::load(state, Wide::Y, operand),
        Operation::Lds => wide::load(state, Wide::Sp, operand),
        Operation::Std => wide::store(state, Wide::D, operand),
        Operation::Stx => wide::store(state, Wide::X, operand),
        Operation::Sty => wide::store(state, Wide::Y, operand),
        Operation::Sts => wide::store(state, Wide::Sp, operand),
        Operation::Inx => wide::step_register(state, Wide::X, 1),
        Operation::Dex => wide::step_register(state, Wide::X, -1),
        Operation::Iny => wide::step_register(state, Wide::Y, 1),
        Operation::Dey => wide::step_register(state, Wide::Y, -1),
        Operation::Ins => wide::step_register(state, Wide::Sp, 1),
        Operation::Des => wide::step_register(state, Wide::Sp, -1),
        Operation::Abx => wide::add_b_to(state, Wide::X),
        Operation::Aby => wide::add_b_to(state, Wide::Y),
        Operation::Xgdx => wide::exchange_d(state, Wide::X),
        Operation::Xgdy => wide::exchange_d(state, Wide::Y),
        Operation::Lsrd => wide::shift_right_d(state),
        Operation::Asld => wide::shift_left_d(state),
        Operation::Mul => wide::multiply(state),
        Operation::Idiv => wide::integer_divide(state),
        Operation::Fdiv => wide::fractional_divide(state),

        Operation::Bra
        | Operation::Brn
        | Operation::Bhi
        | Operation::Bls
        | Operation::Bcc
        | Operation::Bcs
        | Operation::Bne
        | Operation::Beq
        | Operation::Bvc
        | Operation::Bvs
        | Operation::Bpl
        | Operation::Bmi
        | Operation::Bge
        | Operation::Blt
        | Operation::Bgt
        | Operation::Ble => {
            let taken = branch_condition(descriptor.operation, state.regs.ccr()).unwrap_or(false);
            if let (true, Operand::Relative(offset)) = (taken, operand) {
                control::branch(state, offset);
            }
        }
        Operation::Bsr => {
            if let Operand::Relative(offset) = operand {
                control::branch_subroutine(state, offset);
            }
        }
        Operation::Jmp => control::jump(state, operand),
        Operation::Jsr => control::jump_subroutine(state, operand),
        Operation::Rts => control::return_subroutine(state),
        Operation::Rti => control::return_interrupt(state),

        Operation::Psha => control::transfer(state, Transfer::PushA),
        Operation::Pshb => control::transfer(state, Transfer::PushB),
        Operation::Pshx => control::transfer(state, Transfer::PushX),
        Operation::Pshy => control::transfer(state, Transfer::PushY),
        Operation::Pula => control::transfer(state, Transfer::PullA),
        Operation::Pulb => control::transfer(state, Transfer::PullB),
        Operation::Pulx => control::transfer(state, Transfer::PullX),
        Operation::Puly => control::transfer(state, Transfer::PullY),
        Operation::Tsx => control::transfer(state, Transfer::SpToX),
        Operation::Tsy => control::transfer(state, Transfer::SpToY),
        Operation::Txs => control::transfer(state, Transfer::XToSp),
        Operation::Tys => control::transfer(state, Transfer::YToSp),
        Operation::Tap => control::transfer(state, Transfer::AToCcr),
        Operation::Tpa => control::transfer(state, Transfer::CcrToA),

        Operation::Clc => state.regs.set_flag(CCR_C, false),
        Operation::Sec => state.regs.set_flag(CCR_C, true),
        Operation::Clv => state.regs.set_flag(CCR_V, false),
        Operation::Sev => state.regs.set_flag(CCR_V, true),
        Operation::Cli => state.regs.set_flag(CCR_I, false),
        Operation::Sei => state.regs.set_flag(CCR_I, true),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{step_one, ExecuteOutcome};
    use crate::api::CoreState;
    use crate::memory::ObserverId;
    use crate::state::{CCR_C, CCR_I, CCR_N, CCR_V, CCR_Z};

    fn state_with_program(addr: u16, program: &[u8]) -> CoreState {
        let mut state = CoreState::default();
        state.memory.write_block(addr, program);
        state.regs.set_pc(addr);
        state
    }

    #[test]
    fn load_immediate_advances_pc_and_cycles() {
        let mut state = state_with_program(0x0000, &[0x86, 0x05]);
        let outcome = step_one(&mut state);
        assert_eq!(outcome, ExecuteOutcome::Retired { cycles: 2 });
        assert_eq!(state.regs.a(), 5);
        assert_eq!(state.regs.pc(), 2);
        assert_eq!(state.regs.cycles(), 2);
    }

    #[test]
    fn branch_to_self_does_not_advance() {
        let mut state = state_with_program(0x1000, &[0x20, 0xFE]);
        for _ in 0..3 {
            step_one(&mut state);
            assert_eq!(state.regs.pc(), 0x1000);
        }
        assert_eq!(state.regs.cycles(), 9);
    }

    #[rstest]
    #[case(&[0x00], 1)]
    #[case(&[0x18, 0x01], 2)]
    #[case(&[0x1A, 0x00], 2)]
    #[case(&[0xCD, 0x08], 2)]
    fn invalid_opcodes_retire_as_nop(#[case] program: &[u8], #[case] size: u16) {
        let mut state = state_with_program(0x0100, program);
        let outcome = step_one(&mut state);
        assert!(matches!(outcome, ExecuteOutcome::InvalidOpcode { cycles: 2, .. }));
        assert_eq!(state.regs.pc(), 0x0100 + size);
        assert_eq!(state.regs.cycles(), 2);
    }

    #[test]
    fn indexed_y_load_through_prefix() {
        let mut state = state_with_program(0x0200, &[0x18, 0xA6, 0x10]);
        state.regs.set_y(0x0300);
        state.memory.write_silent(0x0310, 0x81);
        assert_eq!(step_one(&mut state).cycles(), 5);
        assert_eq!(state.regs.a(), 0x81);
        assert!(state.regs.flag_is_set(CCR_N));
        assert_eq!(state.regs.pc(), 0x0203);
    }

    #[test]
    fn indexed_jsr_jumps_to_effective_address() {
        let mut state = state_with_program(0x0400, &[0xAD, 0x10]);
        state.regs.set_x(0x0500);
        state.regs.set_sp(0x00FF);
        step_one(&mut state);
        assert_eq!(state.regs.pc(), 0x0510);
        assert_eq!(state.memory.read_u16_silent(0x00FE), 0x0402);
    }

    #[test]
    fn brset_branches_from_end_of_instruction() {
        let mut state = state_with_program(0x0600, &[0x12, 0x40, 0x03, 0x10]);
        state.memory.write_silent(0x0040, 0x07);
        step_one(&mut state);
        assert_eq!(state.regs.pc(), 0x0614);

        let mut state = state_with_program(0x0600, &[0x13, 0x40, 0x03, 0x10]);
        state.memory.write_silent(0x0040, 0x07);
        step_one(&mut state);
        assert_eq!(state.regs.pc(), 0x0604);
    }

    #[test]
    fn flag_instructions_touch_only_their_bit() {
        let mut state = state_with_program(0x0000, &[0x0D, 0x0E, 0x0B]);
        step_one(&mut state);
        assert!(state.regs.flag_is_set(CCR_C));
        step_one(&mut state);
        assert!(!state.regs.flag_is_set(CCR_I));
        step_one(&mut state);
        assert!(state.regs.flag_is_set(CCR_V));
        assert!(!state.regs.flag_is_set(CCR_Z));
    }

    #[test]
    fn instruction_fetch_is_silent_but_data_access_is_trapped() {
        let mut state = state_with_program(0x0040, &[0xB6, 0x00, 0x40]);
        state.memory.traps_mut().add(0x0041, ObserverId::new(1));
        step_one(&mut state);
        assert!(!state.memory.traps().has_hits());

        state.regs.set_pc(0x0040);
        state.memory.traps_mut().add(0x0040, ObserverId::new(1));
        step_one(&mut state);
        let hits = state.memory.traps_mut().take_hits();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].instr_addr, 0x0040);
    }

    proptest! {
        #[test]
        fn conditional_branch_lands_on_one_of_two_targets(offset in any::<i8>(), ccr in any::<u8>()) {
            let mut state = state_with_program(0x8000, &[0x2E, offset.to_ne_bytes()[0]]);
            state.regs.set_ccr(ccr);
            step_one(&mut state);
            let fallthrough = 0x8002u16;
            let taken = fallthrough.wrapping_add_signed(i16::from(offset));
            prop_assert!(state.regs.pc() == fallthrough || state.regs.pc() == taken);
            prop_assert_eq!(state.regs.cycles(), 3);
        }
    }
}
