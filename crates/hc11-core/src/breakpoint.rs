//! Execute, read and write breakpoints built on the memory trap registry.

use std::collections::BTreeSet;
use std::fmt;

use crate::memory::{ObserverId, TrapRegistry};
use crate::state::RunState;

/// Receives trapped accesses for the addresses it registered.
///
/// Notifications are delivered after the accessing instruction retires, in
/// registration order, with the address of that instruction.
pub trait TrapObserver: Send {
    /// A trapped address was read.
    fn on_read(&mut self, addr: u16, instr_addr: u16);
    /// A trapped address was written.
    fn on_write(&mut self, addr: u16, instr_addr: u16);
}

/// Callback invoked with the halt address when a breakpoint fires.
pub type HaltCallback = Box<dyn FnMut(u16) + Send>;

/// Tracks breakpoint sets and turns trap hits into halts.
///
/// Execute breakpoints compare against `PC` after each instruction. Read and
/// write breakpoints register a trap on the bus; a matching access latches a
/// pending halt at the accessing instruction, which the next poll reports.
pub struct BreakpointHandler {
    id: ObserverId,
    exec: BTreeSet<u16>,
    read: BTreeSet<u16>,
    write: BTreeSet<u16>,
    run_state: RunState,
    on_halt: Option<HaltCallback>,
}

impl fmt::Debug for BreakpointHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakpointHandler")
            .field("id", &self.id)
            .field("exec", &self.exec)
            .field("read", &self.read)
            .field("write", &self.write)
            .field("run_state", &self.run_state)
            .field("on_halt", &self.on_halt.is_some())
            .finish()
    }
}

impl BreakpointHandler {
    /// Creates a handler that registers its traps under `id`.
    #[must_use]
    pub const fn new(id: ObserverId) -> Self {
        Self {
            id,
            exec: BTreeSet::new(),
            read: BTreeSet::new(),
            write: BTreeSet::new(),
            run_state: RunState::Running,
            on_halt: None,
        }
    }

    /// Trap registry handle used for read/write breakpoints.
    #[must_use]
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    /// Installs the callback told about every halt.
    pub fn set_halt_callback(&mut self, callback: HaltCallback) {
        self.on_halt = Some(callback);
    }

    /// Current halting state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Clears a halt so execution can continue.
    pub const fn resume(&mut self) {
        self.run_state = RunState::Running;
    }

    /// Adds an execute breakpoint. Returns `false` if it already exists.
    pub fn add_exec(&mut self, addr: u16) -> bool {
        self.exec.insert(addr)
    }

    /// Removes an execute breakpoint. Returns `false` if it did not exist.
    pub fn remove_exec(&mut self, addr: u16) -> bool {
        self.exec.remove(&addr)
    }

    /// Adds a read breakpoint and its trap. Returns `false` if it already exists.
    pub fn add_read(&mut self, traps: &mut TrapRegistry, addr: u16) -> bool {
        let added = self.read.insert(addr);
        if added {
            traps.add(addr, self.id);
        }
        added
    }

    /// Removes a read breakpoint and one of its trap entries.
    pub fn remove_read(&mut self, traps: &mut TrapRegistry, addr: u16) -> bool {
        let removed = self.read.remove(&addr);
        if removed {
            traps.remove(addr, self.id);
        }
        removed
    }

    /// Adds a write breakpoint and its trap. Returns `false` if it already exists.
    pub fn add_write(&mut self, traps: &mut TrapRegistry, addr: u16) -> bool {
        let added = self.write.insert(addr);
        if added {
            traps.add(addr, self.id);
        }
        added
    }

    /// Removes a write breakpoint and one of its trap entries.
    pub fn remove_write(&mut self, traps: &mut TrapRegistry, addr: u16) -> bool {
        let removed = self.write.remove(&addr);
        if removed {
            traps.remove(addr, self.id);
        }
        removed
    }

    /// Drops read and write breakpoints whose traps were removed externally.
    pub fn forget_data_breaks(&mut self, addr: u16) {
        self.read.remove(&addr);
        self.write.remove(&addr);
    }

    /// Execute breakpoints in address order.
    pub fn exec_breaks(&self) -> impl Iterator<Item = u16> + '_ {
        self.exec.iter().copied()
    }

    /// Read breakpoints in address order.
    pub fn read_breaks(&self) -> impl Iterator<Item = u16> + '_ {
        self.read.iter().copied()
    }

    /// Write breakpoints in address order.
    pub fn write_breaks(&self) -> impl Iterator<Item = u16> + '_ {
        self.write.iter().copied()
    }

    /// Post-instruction poll. A pending read/write halt wins over an execute
    /// breakpoint on the new `PC`. Returns the halt address, if any.
    pub fn check_after_step(&mut self, pc: u16) -> Option<u16> {
        let halt_at = match self.run_state {
            RunState::PendingHalt(addr) => Some(addr),
            RunState::Running | RunState::Halted(_) => self.exec.contains(&pc).then_some(pc),
        }?;

        self.run_state = RunState::Halted(halt_at);
        log::debug!("breakpoint halt at 0x{halt_at:04x}");
        if let Some(callback) = self.on_halt.as_mut() {
            callback(halt_at);
        }
        Some(halt_at)
    }
}

impl TrapObserver for BreakpointHandler {
    fn on_read(&mut self, addr: u16, instr_addr: u16) {
        if self.read.contains(&addr) {
            self.run_state = RunState::PendingHalt(instr_addr);
        }
    }

    fn on_write(&mut self, addr: u16, instr_addr: u16) {
        if self.write.contains(&addr) {
            self.run_state = RunState::PendingHalt(instr_addr);
        }
    }
}
