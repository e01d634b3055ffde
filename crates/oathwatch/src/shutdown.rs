//! One-shot stop flag shared by scans, poll workers and automation loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Set once, never cleared.
///
/// Brute-force and region scans check [`is_shutdown`](Self::is_shutdown)
/// between candidates and regions and report `cancelled` with whatever they
/// found so far. Poll workers and automation loops sleep between iterations
/// with [`wait`](Self::wait), so a stop request does not sit out a full
/// poll interval or key delay.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    fired: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal and wake every sleeper.
    pub fn trigger(&self) {
        // a sleeper between its flag check and its wait still sees the notify
        let _guard = self.lock.lock();
        self.fired.store(true, Ordering::SeqCst);
        self.wake.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Sleep up to `duration`. `true` means the signal fired and the caller
    /// should stop.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_shutdown() {
            return true;
        }
        // a poisoned lock means a panicking thread held it; stop
        let Ok(guard) = self.lock.lock() else {
            return true;
        };
        match self
            .wake
            .wait_timeout_while(guard, duration, |_| !self.is_shutdown())
        {
            Ok((_, result)) => !result.timed_out(),
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_fires_once_and_stays_fired() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());
        signal.trigger();
        signal.trigger();
        assert!(signal.is_shutdown());
    }

    #[test]
    fn test_idle_wait_runs_its_full_interval() {
        let signal = ShutdownSignal::new();
        let start = Instant::now();
        assert!(!signal.wait(Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_trigger_cuts_a_poll_interval_short() {
        let signal = Arc::new(ShutdownSignal::new());
        let worker_signal = Arc::clone(&signal);

        let worker = thread::spawn(move || {
            let mut polls = 0;
            let start = Instant::now();
            while !worker_signal.wait(Duration::from_secs(10)) {
                polls += 1;
            }
            (polls, start.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        signal.trigger();

        let (polls, elapsed) = worker.join().unwrap();
        assert_eq!(polls, 0);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_fired_signal_returns_without_sleeping() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        let start = Instant::now();
        assert!(signal.wait(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
