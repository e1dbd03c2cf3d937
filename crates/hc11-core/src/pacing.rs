//! Wall-clock pacing: run a slice of cycles, refresh observers, sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::api::CoreConfig;
use crate::machine::Machine;

/// How long a paused pacing thread waits before checking its flags again.
pub const PAUSED_POLL: Duration = Duration::from_millis(100);

/// Summary of one executed slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceReport {
    /// Instructions executed.
    pub steps: u64,
    /// Breakpoint address if the slice ended early.
    pub halted_at: Option<u16>,
    /// Time to sleep before the next slice.
    pub sleep: Duration,
}

/// Executes slices and tracks how far behind wall-clock time it is running.
#[derive(Debug, Clone)]
pub struct Pacer {
    config: CoreConfig,
    behind_ms: i64,
}

impl Pacer {
    /// Creates a pacer for `config`.
    #[must_use]
    pub const fn new(config: CoreConfig) -> Self {
        Self {
            config,
            behind_ms: 0,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Runs one slice, refreshes observers and returns the sleep budget.
    pub fn run_slice(&mut self, machine: &mut Machine) -> SliceReport {
        let started = Instant::now();
        let target = machine.cycles().saturating_add(self.config.cycles_per_slice());
        let run = machine.run_until(target);
        machine.notify_observers();
        let sleep = self.sleep_budget(started.elapsed());

        log::trace!(
            "slice: {} steps, {} cycles total, sleeping {} ms",
            run.steps,
            machine.cycles(),
            sleep.as_millis()
        );

        SliceReport {
            steps: run.steps,
            halted_at: run.halted_at,
            sleep,
        }
    }

    /// Slice length minus `elapsed`. A slice that overran is remembered and
    /// taken off the next sleep instead of being lost.
    pub fn sleep_budget(&mut self, elapsed: Duration) -> Duration {
        let slice_ms = i64::try_from(self.config.slice_duration().as_millis()).unwrap_or(i64::MAX);
        let elapsed_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        let budget = slice_ms
            .saturating_sub(elapsed_ms)
            .saturating_add(self.behind_ms);

        if budget > 0 {
            self.behind_ms = 0;
            Duration::from_millis(budget.unsigned_abs())
        } else {
            self.behind_ms = budget;
            Duration::ZERO
        }
    }

    /// Forgets any accumulated lag, used when execution is paused.
    pub const fn reset_lag(&mut self) {
        self.behind_ms = 0;
    }
}

/// Cross-thread run/quit flags for a [`PacingThread`].
#[derive(Debug, Clone)]
pub struct RunControl {
    running: Arc<AtomicBool>,
    quit: Arc<AtomicBool>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    /// Creates paused, non-quitting flags.
    #[must_use]
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            quit: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts or pauses execution. Takes effect at the next slice boundary.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Returns `true` while the pacer is executing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Asks the pacing thread to exit.
    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once quitting was requested.
    #[must_use]
    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
}

/// Background thread that paces a shared machine in real time.
#[derive(Debug)]
pub struct PacingThread {
    control: RunControl,
    handle: JoinHandle<()>,
}

impl PacingThread {
    /// Spawns the pacing loop. The thread starts paused.
    #[must_use]
    pub fn spawn(machine: Arc<Mutex<Machine>>, config: CoreConfig) -> Self {
        let control = RunControl::new();
        let thread_control = control.clone();
        let handle = thread::spawn(move || pace(&machine, config, &thread_control));
        Self { control, handle }
    }

    /// Run/quit flags shared with the thread.
    #[must_use]
    pub const fn control(&self) -> &RunControl {
        &self.control
    }

    /// Stops the loop and waits for the thread to exit.
    pub fn join(self) {
        self.control.set_running(false);
        self.control.request_quit();
        if self.handle.join().is_err() {
            log::warn!("pacing thread panicked");
        }
    }
}

fn pace(machine: &Mutex<Machine>, config: CoreConfig, control: &RunControl) {
    let mut pacer = Pacer::new(config);
    while !control.quit_requested() {
        if !control.is_running() {
            pacer.reset_lag();
            thread::sleep(PAUSED_POLL);
            continue;
        }

        let report = {
            let mut machine = machine.lock().unwrap_or_else(PoisonError::into_inner);
            pacer.run_slice(&mut machine)
        };
        if let Some(addr) = report.halted_at {
            log::debug!("pacing paused by breakpoint at 0x{addr:04x}");
            control.set_running(false);
        }
        if !report.sleep.is_zero() {
            thread::sleep(report.sleep);
        }
    }
}
