//! Throughput harness for the 68HC11 core.
//!
//! ## Usage
//!
//! ```sh
//! cargo run -p hc11-core --release --example performance_harness
//! ```
//!
//! Each program runs on several threads for a fixed wall-clock window and
//! reports instructions and cycles per second, plus how many times faster
//! than a 2 MHz part the core runs.

#![allow(clippy::pedantic)]

use hc11_core::{Machine, DEFAULT_CLOCK_HZ};
use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const NUM_THREADS: usize = 4;
const SLICE_CYCLES: u64 = 66_666;

#[derive(Debug, Clone, Copy)]
struct BenchmarkResult {
    name: &'static str,
    instructions_per_second: f64,
    cycles_per_second: f64,
    realtime_factor: f64,
}

/// `inca; bra *-1`
const INC_LOOP: &[u8] = &[0x4C, 0x20, 0xFD];

/// `ldaa #1; adda #2; anda #0x7f; eora #0x55; bra start`
const ALU_LOOP: &[u8] = &[0x86, 0x01, 0x8B, 0x02, 0x84, 0x7F, 0x88, 0x55, 0x20, 0xF6];

/// `ldx #0x4000; staa 0,X; ldab 0,X; pshb; pula; bra start`
const MEMORY_LOOP: &[u8] = &[
    0xCE, 0x40, 0x00, 0xA7, 0x00, 0xE6, 0x00, 0x37, 0x32, 0x20, 0xF5,
];

/// `ldd #0x1234; ldx #0x0007; idiv; mul; daa; bra start`
const MIXED_LOOP: &[u8] = &[
    0xCC, 0x12, 0x34, 0xCE, 0x00, 0x07, 0x02, 0x3D, 0x19, 0x20, 0xF5,
];

fn benchmark(name: &'static str, program: &'static [u8], duration: Duration) -> BenchmarkResult {
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let tx = tx.clone();
            thread::spawn(move || {
                let mut machine = Machine::new();
                machine.write_mem_block(0x0000, program);
                machine.set_pc(0x0000);
                machine.registers_mut().set_sp(0x00FF);

                let mut total_instructions = 0u64;
                let start = Instant::now();
                while start.elapsed() < duration {
                    let target = machine.cycles() + SLICE_CYCLES;
                    total_instructions += machine.run_until(target).steps;
                }

                tx.send((total_instructions, machine.cycles())).ok();
            })
        })
        .collect();

    for h in handles {
        h.join().ok();
    }
    drop(tx);

    let (total_instructions, total_cycles) = rx
        .into_iter()
        .fold((0u64, 0u64), |(i, c), (inst, cyc)| (i + inst, c + cyc));

    let elapsed_secs = duration.as_secs_f64();
    let cycles_per_second = total_cycles as f64 / elapsed_secs;
    BenchmarkResult {
        name,
        instructions_per_second: total_instructions as f64 / elapsed_secs,
        cycles_per_second,
        realtime_factor: cycles_per_second / DEFAULT_CLOCK_HZ as f64,
    }
}

fn format_number(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.2}", n)
    }
}

fn print_results(results: &[BenchmarkResult]) {
    println!();
    println!("hc11-core throughput ({NUM_THREADS} threads)");
    println!(
        "{:12} | {:>12} | {:>12} | {:>10}",
        "Benchmark", "Instr/sec", "Cycles/sec", "x 2 MHz"
    );
    println!("{}", "-".repeat(55));
    for result in results {
        println!(
            "{:12} | {:>12} | {:>12} | {:>10.1}",
            result.name,
            format_number(result.instructions_per_second),
            format_number(result.cycles_per_second),
            result.realtime_factor
        );
    }
}

fn main() {
    let duration = Duration::from_secs(2);
    let results = [
        benchmark("inc_loop", INC_LOOP, duration),
        benchmark("alu_loop", ALU_LOOP, duration),
        benchmark("memory_loop", MEMORY_LOOP, duration),
        benchmark("mixed_loop", MIXED_LOOP, duration),
    ];
    print_results(&results);
}
