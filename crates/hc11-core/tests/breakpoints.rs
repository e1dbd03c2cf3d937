//! Breakpoint timing and observer delivery through the machine facade.

use log as _;
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;

use std::sync::{Arc, Mutex};

use hc11_core::{CoreState, Machine, Observer, RunState, StepOutcome, TrapObserver};
use proptest::prelude::*;
use rstest::rstest;

fn machine_with(addr: u16, program: &[u8]) -> Machine {
    let mut machine = Machine::new();
    machine.write_mem_block(addr, program);
    machine.set_pc(addr);
    machine
}

#[test]
fn read_break_reports_instruction_not_data_address() {
    // nop; ldaa 0x0040; nop
    let mut machine = machine_with(0x1000, &[0x01, 0x96, 0x40, 0x01]);
    assert!(machine.add_read_break(0x0040));

    assert_eq!(machine.step(), StepOutcome::Retired { cycles: 2 });
    assert_eq!(
        machine.step(),
        StepOutcome::BreakpointHit {
            addr: 0x1001,
            cycles: 3
        }
    );
    assert_eq!(machine.step(), StepOutcome::Retired { cycles: 2 });
    assert_eq!(machine.run_state(), RunState::Running);
}

#[rstest]
#[case::direct(&[0x96, 0x40], 3)]
#[case::extended(&[0xB6, 0x00, 0x40], 4)]
#[case::indexed(&[0xA6, 0x40], 4)]
fn read_break_fires_for_every_addressing_mode(#[case] program: &[u8], #[case] cycles: u8) {
    let mut machine = machine_with(0x2000, program);
    machine.add_read_break(0x0040);
    assert_eq!(
        machine.step(),
        StepOutcome::BreakpointHit {
            addr: 0x2000,
            cycles
        }
    );
}

#[test]
fn removed_breakpoint_no_longer_halts() {
    let mut machine = machine_with(0x0000, &[0x97, 0x40, 0x97, 0x40]);
    machine.add_write_break(0x0040);
    assert!(machine.step().breakpoint().is_some());
    assert!(machine.remove_write_break(0x0040));
    assert!(!machine.remove_write_break(0x0040));
    assert_eq!(machine.step(), StepOutcome::Retired { cycles: 3 });
}

#[test]
fn pending_data_halt_wins_over_exec_break_on_same_step() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut machine = machine_with(0x3000, &[0x97, 0x40, 0x01]);
    machine.set_halt_callback(Box::new(move |addr| {
        sink.lock().expect("halt log lock").push(addr);
    }));
    machine.add_write_break(0x0040);
    machine.add_exec_break(0x3002);

    assert_eq!(machine.step().breakpoint(), Some(0x3000));
    assert_eq!(*seen.lock().expect("halt log lock"), vec![0x3000]);
}

#[test]
fn exec_break_halts_on_arrival_and_resumes() {
    let mut machine = machine_with(0x0000, &[0x01, 0x01, 0x01]);
    machine.add_exec_break(0x0001);
    assert_eq!(machine.step().breakpoint(), Some(0x0001));
    assert_eq!(machine.run_state(), RunState::Halted(0x0001));
    assert_eq!(machine.step(), StepOutcome::Retired { cycles: 2 });
    assert_eq!(machine.run_state(), RunState::Running);
}

struct Counter {
    hits: Arc<Mutex<Vec<u16>>>,
}

impl TrapObserver for Counter {
    fn on_read(&mut self, addr: u16, _instr_addr: u16) {
        self.hits.lock().expect("hit log lock").push(addr);
    }

    fn on_write(&mut self, addr: u16, _instr_addr: u16) {
        self.hits.lock().expect("hit log lock").push(addr);
    }
}

#[test]
fn word_access_notifies_both_bytes_in_order() {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let mut machine = machine_with(0x0000, &[0xDC, 0x40, 0xDD, 0x40]);
    let id = machine.add_trap_observer(Box::new(Counter {
        hits: Arc::clone(&hits),
    }));
    machine.add_trap(0x0040, id);
    machine.add_trap(0x0041, id);

    machine.step();
    machine.step();
    assert_eq!(
        *hits.lock().expect("hit log lock"),
        vec![0x0040, 0x0041, 0x0040, 0x0041]
    );

    assert_eq!(machine.remove_traps_for(id), 2);
    machine.set_pc(0x0000);
    machine.step();
    assert_eq!(hits.lock().expect("hit log lock").len(), 4);
}

#[test]
fn opcode_fetch_never_triggers_data_traps() {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let mut machine = machine_with(0x0040, &[0x01, 0x01]);
    let id = machine.add_trap_observer(Box::new(Counter {
        hits: Arc::clone(&hits),
    }));
    machine.add_trap(0x0040, id);
    machine.add_trap(0x0041, id);
    machine.add_read_break(0x0040);

    assert_eq!(machine.step(), StepOutcome::Retired { cycles: 2 });
    assert_eq!(machine.step(), StepOutcome::Retired { cycles: 2 });
    assert!(hits.lock().expect("hit log lock").is_empty());
}

struct PcView {
    name: String,
    seen: Arc<Mutex<Vec<u16>>>,
}

impl Observer for PcView {
    fn name(&self) -> &str {
        &self.name
    }

    fn visual_update(&mut self, state: &CoreState) {
        self.seen.lock().expect("view lock").push(state.regs.pc());
    }
}

#[test]
fn observers_refresh_on_demand_and_reject_duplicates() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut machine = machine_with(0x0010, &[0x01]);
    assert!(machine.add_observer(Box::new(PcView {
        name: "Registers".to_owned(),
        seen: Arc::clone(&seen),
    })));
    assert!(!machine.add_observer(Box::new(PcView {
        name: "registers".to_owned(),
        seen: Arc::clone(&seen),
    })));

    machine.step();
    machine.notify_observers();
    assert_eq!(*seen.lock().expect("view lock"), vec![0x0011]);

    assert!(machine.remove_observer("REGISTERS"));
    machine.notify_observers();
    assert_eq!(seen.lock().expect("view lock").len(), 1);
}

proptest! {
    #[test]
    fn read_break_halts_at_accessing_instruction(
        instr_addr in 0x1000u16..0xF000,
        data_addr in 0x0000u16..0x0100,
    ) {
        let [_, direct] = data_addr.to_be_bytes();
        let mut machine = machine_with(instr_addr, &[0x96, direct]);
        machine.add_read_break(data_addr);
        prop_assert_eq!(machine.step().breakpoint(), Some(instr_addr));
        prop_assert_eq!(machine.run_state(), RunState::Halted(instr_addr));
    }
}
