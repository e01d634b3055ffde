//! Per-character automation workers.
//!
//! An [`AutomationLoop`] runs one step closure on its own thread until it is
//! stopped or the step fails. Stopping is cooperative: the step gets the
//! loop's [`ShutdownSignal`] and should return promptly once it fires.

mod input;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::Result;
use crate::memory::layout::timing::AUTOMATION_STOP_GRACE_MS;
use crate::shutdown::ShutdownSignal;

pub use input::{KeyInput, SkillKey, WindowKeyInput, find_window_by_pid, run_combo};

struct Worker {
    handle: JoinHandle<()>,
    done: Receiver<()>,
    signal: Arc<ShutdownSignal>,
}

/// Clears the running flag and reports completion even if the step panics.
struct ExitGuard {
    running: Arc<AtomicBool>,
    done: Sender<()>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.done.send(());
    }
}

pub struct AutomationLoop {
    pid: u32,
    running: Arc<AtomicBool>,
    worker: Option<Worker>,
    grace: Duration,
}

impl AutomationLoop {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            grace: Duration::from_millis(AUTOMATION_STOP_GRACE_MS),
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run `step` every `interval` until stopped or until it returns an error.
    ///
    /// Returns `false` without doing anything if the loop is already running.
    pub fn start<F>(&mut self, interval: Duration, mut step: F) -> bool
    where
        F: FnMut(&ShutdownSignal) -> Result<()> + Send + 'static,
    {
        if self.is_running() {
            return false;
        }
        // A previous worker that outlived its grace period has finished by now
        if let Some(worker) = self.worker.take() {
            let _ = worker.handle.join();
        }

        let signal = Arc::new(ShutdownSignal::new());
        let (done_tx, done_rx) = mpsc::channel();
        self.running.store(true, Ordering::SeqCst);

        let guard = ExitGuard {
            running: Arc::clone(&self.running),
            done: done_tx,
        };
        let worker_signal = Arc::clone(&signal);
        let pid = self.pid;
        let handle = thread::spawn(move || {
            let _guard = guard;
            info!("Automation started for pid {}", pid);
            while !worker_signal.is_shutdown() {
                if let Err(e) = step(&worker_signal) {
                    warn!("Automation for pid {} stopped: {}", pid, e);
                    break;
                }
                if worker_signal.wait(interval) {
                    break;
                }
            }
            info!("Automation finished for pid {}", pid);
        });

        self.worker = Some(Worker {
            handle,
            done: done_rx,
            signal,
        });
        true
    }

    /// Signal the worker and wait up to the grace period for it to finish.
    ///
    /// Returns `true` if the worker has exited. A worker still busy after the
    /// grace period is left to finish on its own.
    pub fn stop(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return true;
        };
        worker.signal.trigger();

        match worker.done.recv_timeout(self.grace) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = worker.handle.join();
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Automation for pid {} did not stop within {:?}",
                    self.pid, self.grace
                );
                self.worker = Some(worker);
                false
            }
        }
    }
}

impl Drop for AutomationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
