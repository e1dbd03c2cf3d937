//! Host-facing configuration, state and step/run outcome types.

use std::time::Duration;

use crate::fault::Fault;
use crate::memory::MemoryBus;
use crate::state::Registers;

/// Default emulated clock rate in Hz.
pub const DEFAULT_CLOCK_HZ: u64 = 2_000_000;

/// Default observer refresh rate in Hz.
pub const DEFAULT_REFRESH_HZ: u32 = 30;

/// Clock and refresh settings used by the real-time pacer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Emulated clock rate in Hz.
    pub clock_hz: u64,
    /// Observer refresh rate in Hz; one execution slice per refresh.
    pub refresh_hz: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            refresh_hz: DEFAULT_REFRESH_HZ,
        }
    }
}

impl CoreConfig {
    /// Cycles executed per slice (`clock / refresh`).
    #[must_use]
    pub fn cycles_per_slice(&self) -> u64 {
        self.clock_hz / u64::from(self.refresh_hz.max(1))
    }

    /// Wall-clock length of one slice, rounded up to whole milliseconds.
    #[must_use]
    pub fn slice_duration(&self) -> Duration {
        Duration::from_millis(1000_u64.div_ceil(u64::from(self.refresh_hz.max(1))))
    }
}

/// Register file plus memory bus: everything an instruction can touch.
#[derive(Debug, Clone, Default)]
pub struct CoreState {
    /// Programmer-visible registers and cycle counter.
    pub regs: Registers,
    /// 64 KiB memory with its trap registry.
    pub memory: MemoryBus,
}

impl CoreState {
    /// Restores the register file to its reset values. Memory and traps are kept.
    pub fn reset_registers(&mut self) {
        self.regs = Registers::default();
    }
}

/// Result of one [`crate::Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Instruction retired with its fixed cycle cost.
    Retired {
        /// Cycles charged.
        cycles: u8,
    },
    /// Unmapped opcode executed as a two-cycle no-op.
    InvalidOpcode {
        /// Diagnostic naming the byte, page and address.
        fault: Fault,
        /// Cycles charged.
        cycles: u8,
    },
    /// The instruction retired and a breakpoint halted the machine.
    BreakpointHit {
        /// Address reported to the halt callback.
        addr: u16,
        /// Cycles charged by the instruction that just retired.
        cycles: u8,
    },
}

impl StepOutcome {
    /// Cycles charged by the step.
    #[must_use]
    pub const fn cycles(self) -> u8 {
        match self {
            Self::Retired { cycles }
            | Self::InvalidOpcode { cycles, .. }
            | Self::BreakpointHit { cycles, .. } => cycles,
        }
    }

    /// Halt address when a breakpoint fired.
    #[must_use]
    pub const fn breakpoint(self) -> Option<u16> {
        match self {
            Self::BreakpointHit { addr, .. } => Some(addr),
            Self::Retired { .. } | Self::InvalidOpcode { .. } => None,
        }
    }
}

/// Aggregated outcome of a batched run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Instructions executed.
    pub steps: u64,
    /// Breakpoint address when the run stopped early.
    pub halted_at: Option<u16>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CoreConfig, CoreState, StepOutcome, DEFAULT_CLOCK_HZ};
    use crate::state::CCR_RESET;

    #[test]
    fn default_config_matches_two_megahertz_at_thirty_hertz() {
        let config = CoreConfig::default();
        assert_eq!(config.clock_hz, DEFAULT_CLOCK_HZ);
        assert_eq!(config.cycles_per_slice(), 66_666);
        assert_eq!(config.slice_duration(), Duration::from_millis(34));
    }

    #[test]
    fn zero_refresh_rate_is_treated_as_one() {
        let config = CoreConfig {
            clock_hz: 1_000,
            refresh_hz: 0,
        };
        assert_eq!(config.cycles_per_slice(), 1_000);
        assert_eq!(config.slice_duration(), Duration::from_secs(1));
    }

    #[test]
    fn reset_keeps_memory() {
        let mut state = CoreState::default();
        state.memory.write_silent(0x1234, 0x56);
        state.regs.set_a(0x77);
        state.regs.clear_ccr_bits(0xFF);
        state.reset_registers();
        assert_eq!(state.regs.a(), 0);
        assert_eq!(state.regs.ccr(), CCR_RESET);
        assert_eq!(state.memory.read_silent(0x1234), 0x56);
    }

    #[test]
    fn step_outcome_exposes_cycles_and_breakpoint() {
        let hit = StepOutcome::BreakpointHit {
            addr: 0x2000,
            cycles: 4,
        };
        assert_eq!(hit.cycles(), 4);
        assert_eq!(hit.breakpoint(), Some(0x2000));
        assert_eq!(StepOutcome::Retired { cycles: 2 }.breakpoint(), None);
    }
}
