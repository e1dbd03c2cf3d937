//! The machine aggregate: core state, breakpoints, trap observers and views.

use std::collections::BTreeMap;
use std::fmt;

use crate::api::{CoreState, RunOutcome, StepOutcome};
use crate::breakpoint::{BreakpointHandler, HaltCallback, TrapObserver};
use crate::disasm::{disassemble, DecodedInstruction};
use crate::execute::{step_one, ExecuteOutcome};
use crate::memory::{MemoryBus, ObserverId, TrapHit, TrapKind};
use crate::observer::{Observer, ObserverList};
use crate::state::{Registers, RunState};

/// Trap handle reserved for the built-in breakpoint handler.
pub const BREAKPOINT_OBSERVER: ObserverId = ObserverId::new(0);

/// A complete 68HC11 machine.
///
/// All mutation happens on the thread that owns the machine; the pacing
/// thread shares it behind a mutex and only ever calls [`Machine::step`] and
/// [`Machine::notify_observers`].
pub struct Machine {
    state: CoreState,
    breakpoints: BreakpointHandler,
    trap_observers: BTreeMap<ObserverId, Box<dyn TrapObserver>>,
    next_observer_id: u32,
    observers: ObserverList,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("regs", &self.state.regs)
            .field("breakpoints", &self.breakpoints)
            .field("trap_observers", &self.trap_observers.keys())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

impl Machine {
    /// Creates a machine with zeroed memory and reset registers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CoreState::default(),
            breakpoints: BreakpointHandler::new(BREAKPOINT_OBSERVER),
            trap_observers: BTreeMap::new(),
            next_observer_id: BREAKPOINT_OBSERVER.raw() + 1,
            observers: ObserverList::new(),
        }
    }

    /// Executes one instruction, delivers trap hits and polls breakpoints.
    pub fn step(&mut self) -> StepOutcome {
        self.breakpoints.resume();
        let outcome = step_one(&mut self.state);
        self.deliver_trap_hits();

        let cycles = outcome.cycles();
        if let Some(addr) = self.breakpoints.check_after_step(self.state.regs.pc()) {
            return StepOutcome::BreakpointHit { addr, cycles };
        }
        match outcome {
            ExecuteOutcome::Retired { cycles } => StepOutcome::Retired { cycles },
            ExecuteOutcome::InvalidOpcode { fault, cycles } => {
                StepOutcome::InvalidOpcode { fault, cycles }
            }
        }
    }

    /// Steps until the cycle counter reaches `cycle_target` or a breakpoint fires.
    pub fn run_until(&mut self, cycle_target: u64) -> RunOutcome {
        let mut steps = 0;
        while self.cycles() < cycle_target {
            let outcome = self.step();
            steps += 1;
            if let Some(addr) = outcome.breakpoint() {
                return RunOutcome {
                    steps,
                    halted_at: Some(addr),
                };
            }
        }
        RunOutcome {
            steps,
            halted_at: None,
        }
    }

    fn deliver_trap_hits(&mut self) {
        if !self.state.memory.traps().has_hits() {
            return;
        }
        for TrapHit {
            observer,
            kind,
            addr,
            instr_addr,
        } in self.state.memory.traps_mut().take_hits()
        {
            let target: &mut dyn TrapObserver = if observer == BREAKPOINT_OBSERVER {
                &mut self.breakpoints
            } else if let Some(target) = self.trap_observers.get_mut(&observer) {
                target.as_mut()
            } else {
                continue;
            };
            match kind {
                TrapKind::Read => target.on_read(addr, instr_addr),
                TrapKind::Write => target.on_write(addr, instr_addr),
            }
        }
    }

    /// Restores registers to their reset values; memory, traps and
    /// breakpoints are kept.
    pub fn reset(&mut self) {
        self.state.reset_registers();
        self.breakpoints.resume();
    }

    /// Copies `data` into memory at `addr` without firing traps.
    pub fn write_mem_block(&mut self, addr: u16, data: &[u8]) {
        self.state.memory.write_block(addr, data);
    }

    /// Sets the program counter.
    pub const fn set_pc(&mut self, pc: u16) {
        self.state.regs.set_pc(pc);
    }

    /// Program counter.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.state.regs.pc()
    }

    /// Cycles charged since reset.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.state.regs.cycles()
    }

    /// Register file.
    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.state.regs
    }

    /// Mutable register file.
    pub const fn registers_mut(&mut self) -> &mut Registers {
        &mut self.state.regs
    }

    /// Memory bus.
    #[must_use]
    pub const fn memory(&self) -> &MemoryBus {
        &self.state.memory
    }

    /// Registers and memory together.
    #[must_use]
    pub const fn state(&self) -> &CoreState {
        &self.state
    }

    /// Disassembles the instruction at `addr` without side effects.
    #[must_use]
    pub fn disassemble(&self, addr: u16) -> DecodedInstruction {
        disassemble(&self.state.memory, addr)
    }

    /// Registers a trap observer and returns its handle.
    pub fn add_trap_observer(&mut self, observer: Box<dyn TrapObserver>) -> ObserverId {
        let id = ObserverId::new(self.next_observer_id);
        self.next_observer_id += 1;
        self.trap_observers.insert(id, observer);
        id
    }

    /// Unregisters a trap observer and drops all of its traps.
    pub fn remove_trap_observer(&mut self, id: ObserverId) -> Option<Box<dyn TrapObserver>> {
        let observer = self.trap_observers.remove(&id)?;
        self.state.memory.traps_mut().remove_observer(id);
        Some(observer)
    }

    /// Traps `addr` for observer `id`. Returns `false` for an unknown handle.
    pub fn add_trap(&mut self, addr: u16, id: ObserverId) -> bool {
        if !self.trap_observers.contains_key(&id) {
            return false;
        }
        self.state.memory.traps_mut().add(addr, id);
        true
    }

    /// Removes one `(addr, id)` trap registration.
    pub fn remove_trap(&mut self, addr: u16, id: ObserverId) -> bool {
        self.state.memory.traps_mut().remove(addr, id)
    }

    /// Removes every trap on `addr`, including read/write breakpoints there.
    pub fn remove_traps_at(&mut self, addr: u16) -> usize {
        self.breakpoints.forget_data_breaks(addr);
        self.state.memory.traps_mut().remove_at(addr)
    }

    /// Removes every trap registered by `id`.
    pub fn remove_traps_for(&mut self, id: ObserverId) -> usize {
        self.state.memory.traps_mut().remove_observer(id)
    }

    /// Adds an execute breakpoint. Returns `false` if it already exists.
    pub fn add_exec_break(&mut self, addr: u16) -> bool {
        self.breakpoints.add_exec(addr)
    }

    /// Removes an execute breakpoint.
    pub fn remove_exec_break(&mut self, addr: u16) -> bool {
        self.breakpoints.remove_exec(addr)
    }

    /// Adds a read breakpoint. Returns `false` if it already exists.
    pub fn add_read_break(&mut self, addr: u16) -> bool {
        self.breakpoints
            .add_read(self.state.memory.traps_mut(), addr)
    }

    /// Removes a read breakpoint.
    pub fn remove_read_break(&mut self, addr: u16) -> bool {
        self.breakpoints
            .remove_read(self.state.memory.traps_mut(), addr)
    }

    /// Adds a write breakpoint. Returns `false` if it already exists.
    pub fn add_write_break(&mut self, addr: u16) -> bool {
        self.breakpoints
            .add_write(self.state.memory.traps_mut(), addr)
    }

    /// Removes a write breakpoint.
    pub fn remove_write_break(&mut self, addr: u16) -> bool {
        self.breakpoints
            .remove_write(self.state.memory.traps_mut(), addr)
    }

    /// Installs the callback told about every breakpoint halt.
    pub fn set_halt_callback(&mut self, callback: HaltCallback) {
        self.breakpoints.set_halt_callback(callback);
    }

    /// Breakpoint handler, for listing breakpoints.
    #[must_use]
    pub const fn breakpoints(&self) -> &BreakpointHandler {
        &self.breakpoints
    }

    /// Breakpoint halting state after the last step.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.breakpoints.run_state()
    }

    /// Registers a display observer. Returns `false` on a duplicate name.
    pub fn add_observer(&mut self, observer: Box<dyn Observer>) -> bool {
        self.observers.add(observer)
    }

    /// Unregisters the display observer called `name`.
    pub fn remove_observer(&mut self, name: &str) -> bool {
        self.observers.remove(name).is_some()
    }

    /// Refreshes every display observer.
    pub fn notify_observers(&mut self) {
        self.observers.notify(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::Machine;
    use crate::api::StepOutcome;
    use crate::breakpoint::TrapObserver;
    use crate::state::{RunState, CCR_RESET};

    #[derive(Default)]
    struct AccessLog {
        events: Arc<Mutex<Vec<(char, u16, u16)>>>,
    }

    impl TrapObserver for AccessLog {
        fn on_read(&mut self, addr: u16, instr_addr: u16) {
            self.events
                .lock()
                .expect("access log lock")
                .push(('r', addr, instr_addr));
        }

        fn on_write(&mut self, addr: u16, instr_addr: u16) {
            self.events
                .lock()
                .expect("access log lock")
                .push(('w', addr, instr_addr));
        }
    }

    #[test]
    fn user_trap_observer_sees_data_accesses() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut machine = Machine::new();
        let id = machine.add_trap_observer(Box::new(AccessLog {
            events: Arc::clone(&events),
        }));
        assert!(machine.add_trap(0x0040, id));

        machine.write_mem_block(0x1000, &[0x96, 0x40, 0x97, 0x40]);
        machine.set_pc(0x1000);
        machine.step();
        machine.step();

        assert_eq!(
            *events.lock().expect("access log lock"),
            vec![('r', 0x0040, 0x1000), ('w', 0x0040, 0x1002)]
        );
    }

    #[test]
    fn unknown_trap_handle_is_rejected() {
        let mut machine = Machine::new();
        let id = machine.add_trap_observer(Box::<AccessLog>::default());
        assert!(machine.remove_trap_observer(id).is_some());
        assert!(!machine.add_trap(0x0040, id));
    }

    #[test]
    fn write_breakpoint_halts_at_accessing_instruction() {
        let mut machine = Machine::new();
        machine.write_mem_block(0x2000, &[0x86, 0x01, 0x97, 0x80, 0x01]);
        machine.set_pc(0x2000);
        assert!(machine.add_write_break(0x0080));

        assert_eq!(machine.step(), StepOutcome::Retired { cycles: 2 });
        assert_eq!(
            machine.step(),
            StepOutcome::BreakpointHit {
                addr: 0x2002,
                cycles: 3
            }
        );
        assert_eq!(machine.pc(), 0x2004);
        assert_eq!(machine.run_state(), RunState::Halted(0x2002));
        assert_eq!(machine.memory().read_silent(0x0080), 0x01);
    }

    #[test]
    fn removing_traps_at_address_clears_data_breakpoints() {
        let mut machine = Machine::new();
        machine.add_read_break(0x0040);
        assert_eq!(machine.remove_traps_at(0x0040), 1);
        assert_eq!(machine.breakpoints().read_breaks().count(), 0);
        assert!(machine.add_read_break(0x0040));
    }

    #[test]
    fn run_until_stops_at_exec_breakpoint() {
        let mut machine = Machine::new();
        machine.write_mem_block(0x0000, &[0x01, 0x01, 0x01, 0x20, 0xFE]);
        machine.add_exec_break(0x0003);
        let outcome = machine.run_until(1_000);
        assert_eq!(outcome.halted_at, Some(0x0003));
        assert_eq!(outcome.steps, 3);
        assert_eq!(machine.cycles(), 6);
    }

    #[test]
    fn reset_restores_registers_but_keeps_memory() {
        let mut machine = Machine::new();
        machine.write_mem_block(0x0000, &[0x86, 0x42]);
        machine.step();
        machine.reset();
        assert_eq!(machine.registers().a(), 0);
        assert_eq!(machine.registers().ccr(), CCR_RESET);
        assert_eq!(machine.pc(), 0);
        assert_eq!(machine.memory().read_silent(0x0001), 0x42);
    }
}
