//! A thread-safe handle to a machine, for a driver that steps on one thread
//! while other threads render state and deliver interrupts.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::emulator::error::{Fault, MemoryError};
use crate::emulator::machine::{InterruptKind, Machine};

/// Why `SharedMachine::run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The program halted or ran off the end of the loaded code.
    Finished,
    /// `stop` was called.
    Stopped,
    /// The step budget was used up.
    StepLimit,
    /// A fault that halts the machine.
    Fault(Fault),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: u64,
    pub reason: StopReason,
}

struct Control {
    paused: bool,
    stopped: bool,
}

/// Every operation takes the machine lock for its whole critical section, so no
/// thread sees an instruction or an interrupt delivery half done.
/// Clone it to hand it to another thread.
#[derive(Clone)]
pub struct SharedMachine {
    machine: Arc<Mutex<Machine>>,
    control: Arc<(Mutex<Control>, Condvar)>,
}

/// A poisoned lock only means another thread panicked mid-operation; the machine is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SharedMachine {

    pub fn new(machine: Machine) -> SharedMachine {
        SharedMachine {
            machine: Arc::new(Mutex::new(machine)),
            control: Arc::new((
                Mutex::new(Control {
                    paused: false,
                    stopped: false,
                }),
                Condvar::new(),
            )),
        }
    }

    pub fn step(&self) -> Result<(), Fault> {
        lock(&self.machine).step()
    }

    pub fn raise_interrupt(&self, kind: InterruptKind, key: u8) -> Result<bool, MemoryError> {
        lock(&self.machine).raise_interrupt(kind, key)
    }

    /// Inspect the machine while holding the lock.
    pub fn with<T>(&self, f: impl FnOnce(&Machine) -> T) -> T {
        f(&lock(&self.machine))
    }

    /// Modify the machine while holding the lock, e.g. to load or reset it.
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut Machine) -> T) -> T {
        f(&mut lock(&self.machine))
    }

    /// Make `run` block before its next step until `resume` is called.
    pub fn pause(&self) {
        lock(&self.control.0).paused = true;
    }

    pub fn resume(&self) {
        let (control, condvar) = &*self.control;
        lock(control).paused = false;
        condvar.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.control.0).paused
    }

    /// Make `run` return before its next step, even if paused.
    pub fn stop(&self) {
        let (control, condvar) = &*self.control;
        lock(control).stopped = true;
        condvar.notify_all();
    }

    /// Wait while paused. Returns false if stopped, and clears the stop request.
    fn wait_for_go(&self) -> bool {
        let (control, condvar) = &*self.control;
        let mut guard = lock(control);
        while guard.paused && !guard.stopped {
            guard = condvar.wait(guard).unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if guard.stopped {
            guard.stopped = false;
            return false;
        }
        true
    }

    /// Step until the program finishes, `stop` is called, `max_steps` is reached,
    /// or a fault halts the machine. Recoverable faults are logged and skipped.
    pub fn run(&self, max_steps: Option<u64>) -> RunSummary {
        let mut steps = 0;
        let reason = loop {
            if max_steps.map_or(false, |max| steps >= max) {
                break StopReason::StepLimit;
            }
            if !self.wait_for_go() {
                break StopReason::Stopped;
            }

            let mut machine = lock(&self.machine);
            if !machine.is_running() {
                break StopReason::Finished;
            }
            let result = machine.step();
            steps += 1;
            match result {
                Ok(()) => {}
                Err(fault) if machine.is_halted() => break StopReason::Fault(fault),
                Err(fault) => log::warn!("{}", fault),
            }
        };
        log::info!("Stopped after {} steps: {:?}", steps, reason);
        RunSummary { steps, reason }
    }
}
