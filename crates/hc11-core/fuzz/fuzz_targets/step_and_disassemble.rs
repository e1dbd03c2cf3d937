#![no_main]

use hc11_core::{disassemble_window, load_s19, Machine};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let start = u16::from_be_bytes([data[0], data[1]]);
    let steps = usize::from(data[2]);
    let image = &data[3..];

    let mut machine = Machine::new();
    machine.write_mem_block(start, image);
    machine.set_pc(start);
    if let Some(&probe) = image.first() {
        machine.add_read_break(u16::from(probe));
        machine.add_write_break(u16::from(probe) << 8);
    }

    let _ = disassemble_window(machine.memory(), start, 32);
    for _ in 0..steps {
        let _ = machine.step();
    }

    if let Ok(text) = std::str::from_utf8(image) {
        let _ = load_s19(&mut machine, text);
    }
});
