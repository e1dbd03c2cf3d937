//! Motorola 68HC11 CPU core: registers, memory bus, decoder, disassembler and breakpoints.

/// 64 KiB memory bus with the access trap registry.
pub mod memory;
pub use memory::{
    new_address_space, MemoryBus, ObserverId, TrapEntry, TrapHit, TrapKind, TrapRegistry,
    ADDRESS_SPACE_BYTES,
};

/// Host-facing configuration, state and outcome types.
pub mod api;
pub use api::{
    CoreConfig, CoreState, RunOutcome, StepOutcome, DEFAULT_CLOCK_HZ, DEFAULT_REFRESH_HZ,
};

/// Register file, condition codes and halting state.
pub mod state;
pub use state::{
    Registers, RunState, CCR_C, CCR_H, CCR_I, CCR_N, CCR_RESET, CCR_S, CCR_V, CCR_X, CCR_Z,
};

/// Opcode pages, addressing modes and the dispatch table.
pub mod encoding;
pub use encoding::{
    classify_opcode, dispatch_table, system_mnemonic, AddressingMode, DispatchTable, OpDescriptor,
    Operation, Page, OPCODE_TABLE,
};

/// Instruction fetch: page prefix, opcode and descriptor lookup.
pub mod decoder;
pub use decoder::{decode_at, Fetched};

/// Diagnostics reported while executing or loading.
pub mod fault;
pub use fault::Fault;

/// Per-opcode cycle costs.
pub mod timing;
pub use timing::{charged_cycles, cycle_cost, INVALID_OPCODE_CYCLES};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    branch_condition, normalize16, normalize8, relative_target, step_one, ExecuteOutcome, Operand,
    Operands,
};

/// Side-effect free instruction disassembly.
pub mod disasm;
pub use disasm::{
    disassemble, disassemble_window, DecodedInstruction, INVALID_DESCRIPTION, INVALID_TEXT,
};

/// Execute/read/write breakpoints and trap observers.
pub mod breakpoint;
pub use breakpoint::{BreakpointHandler, HaltCallback, TrapObserver};

/// Display observers refreshed after each slice.
pub mod observer;
pub use observer::{Observer, ObserverList};

/// Machine aggregate tying state, breakpoints and observers together.
pub mod machine;
pub use machine::{Machine, BREAKPOINT_OBSERVER};

/// Real-time pacing of a shared machine.
pub mod pacing;
pub use pacing::{Pacer, PacingThread, RunControl, SliceReport, PAUSED_POLL};

/// S19, ELF, binary and hex-dump image loaders.
pub mod loader;
pub use loader::{
    convert_hex_dump, load_binary, load_elf, load_file, load_s19, ImageFormat, LoadError,
    LoadTarget,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
