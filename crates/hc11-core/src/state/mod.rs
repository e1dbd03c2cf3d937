//! Architectural CPU state model primitives.

/// Register file, CCR bit layout and cycle counter.
pub mod registers;
/// Breakpoint halting state machine.
pub mod run_state;

pub use registers::{
    Registers, CCR_C, CCR_H, CCR_I, CCR_N, CCR_RESET, CCR_S, CCR_V, CCR_X, CCR_Z,
};
pub use run_state::RunState;
