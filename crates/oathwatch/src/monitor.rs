//! Background polling of every attached game client.
//!
//! Each client gets its own worker thread holding its own process handle.
//! Workers never touch shared mutable state: every poll builds a fresh
//! [`CharacterSnapshot`] and sends it over a channel to whoever owns the
//! receiving end.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::game::{CharacterSnapshot, SceneTable, SnapshotReader};
use crate::memory::{MemoryAccessor, ProcessHandle, find_processes};
use crate::offset::PointerChains;
use crate::shutdown::ShutdownSignal;

/// What a poll worker reports.
#[derive(Debug, Clone)]
pub enum PollEvent {
    Snapshot(CharacterSnapshot),
    /// The worker ended because the process went away or could not be opened.
    Detached { pid: u32, reason: String },
    /// A poll failed but the worker keeps going.
    Error { pid: u32, message: String },
}

impl PollEvent {
    pub fn pid(&self) -> u32 {
        match self {
            PollEvent::Snapshot(snapshot) => snapshot.pid,
            PollEvent::Detached { pid, .. } | PollEvent::Error { pid, .. } => *pid,
        }
    }
}

/// Produces one snapshot per call for one client.
///
/// Errors for which [`Error::is_attach_failure`](crate::Error::is_attach_failure)
/// holds end the worker; any other error is reported and polling continues.
pub trait SnapshotSource: Send + 'static {
    fn pid(&self) -> u32;
    fn poll(&mut self) -> Result<CharacterSnapshot>;
}

/// Chains and scene names shared by every worker.
#[derive(Debug, Clone)]
pub struct MonitorTarget {
    pub process_name: String,
    pub module_name: String,
    pub chains: Arc<PointerChains>,
    pub scenes: Arc<SceneTable>,
}

impl MonitorTarget {
    pub fn from_config(config: &Config) -> Self {
        Self {
            process_name: config.process_name.clone(),
            module_name: config.module_name.clone(),
            chains: Arc::new(config.chains.clone()),
            scenes: Arc::new(config.scenes()),
        }
    }
}

/// A live process polled through its own handle.
pub struct ProcessSource {
    process: ProcessHandle,
    target: MonitorTarget,
}

impl ProcessSource {
    pub fn attach(pid: u32, target: &MonitorTarget) -> Result<Self> {
        let process = ProcessHandle::attach(pid, &target.module_name)?;
        Ok(Self {
            process,
            target: target.clone(),
        })
    }
}

impl SnapshotSource for ProcessSource {
    fn pid(&self) -> u32 {
        self.process.pid
    }

    fn poll(&mut self) -> Result<CharacterSnapshot> {
        // chains are walked from a freshly resolved base on every poll
        self.process.refresh_base()?;
        let accessor = MemoryAccessor::new(&self.process);
        Ok(SnapshotReader::new(&self.target.chains)
            .with_scenes(&self.target.scenes)
            .capture(&accessor, self.process.pid))
    }
}

fn poll_loop<S: SnapshotSource>(
    mut source: S,
    interval: Duration,
    events: Sender<PollEvent>,
    signal: Arc<ShutdownSignal>,
) {
    let pid = source.pid();
    info!("Polling process {} every {:?}", pid, interval);

    while !signal.is_shutdown() {
        let event = match source.poll() {
            Ok(snapshot) => {
                if !snapshot.is_available() {
                    debug!("Process {}: stats chain unresolved", pid);
                }
                PollEvent::Snapshot(snapshot)
            }
            Err(e) if e.is_attach_failure() => {
                warn!("Process {} detached: {}", pid, e);
                let _ = events.send(PollEvent::Detached {
                    pid,
                    reason: e.to_string(),
                });
                return;
            }
            Err(e) => PollEvent::Error {
                pid,
                message: e.to_string(),
            },
        };
        if events.send(event).is_err() {
            debug!("Receiver for process {} dropped", pid);
            return;
        }
        if signal.wait(interval) {
            break;
        }
    }
    info!("Stopped polling process {}", pid);
}

/// Owns one poll worker per watched process.
pub struct Monitor {
    interval: Duration,
    events: Sender<PollEvent>,
    signal: Arc<ShutdownSignal>,
    workers: HashMap<u32, JoinHandle<()>>,
}

impl Monitor {
    /// Create a monitor and the receiver its workers report to.
    pub fn new(interval: Duration, signal: Arc<ShutdownSignal>) -> (Self, Receiver<PollEvent>) {
        let (events, receiver) = mpsc::channel();
        let monitor = Self {
            interval,
            events,
            signal,
            workers: HashMap::new(),
        };
        (monitor, receiver)
    }

    /// Start polling `source`. Returns `false` if its pid is already watched.
    pub fn watch<S: SnapshotSource>(&mut self, source: S) -> bool {
        self.prune();
        let pid = source.pid();
        if self.workers.contains_key(&pid) {
            return false;
        }

        let events = self.events.clone();
        let signal = Arc::clone(&self.signal);
        let interval = self.interval;
        let handle = thread::spawn(move || poll_loop(source, interval, events, signal));
        self.workers.insert(pid, handle);
        true
    }

    pub fn is_watching(&self, pid: u32) -> bool {
        self.workers
            .get(&pid)
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn watched(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self
            .workers
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(&pid, _)| pid)
            .collect();
        pids.sort_unstable();
        pids
    }

    /// Join workers that have exited so their pids can be watched again.
    pub fn prune(&mut self) {
        let finished: Vec<u32> = self
            .workers
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(&pid, _)| pid)
            .collect();
        for pid in finished {
            if let Some(handle) = self.workers.remove(&pid) {
                let _ = handle.join();
            }
        }
    }

    /// Attach to every matching process not already watched.
    ///
    /// Attach failures are logged and retried on the next call.
    pub fn discover(&mut self, target: &MonitorTarget) -> Vec<u32> {
        self.prune();
        let pids = match find_processes(&target.process_name) {
            Ok(pids) => pids,
            Err(e) => {
                warn!("Process discovery failed: {}", e);
                return Vec::new();
            }
        };

        let mut attached = Vec::new();
        for pid in pids {
            if self.workers.contains_key(&pid) {
                continue;
            }
            match ProcessSource::attach(pid, target) {
                Ok(source) => {
                    if self.watch(source) {
                        attached.push(pid);
                    }
                }
                Err(e) => warn!("Cannot attach to process {}: {}", pid, e),
            }
        }
        attached
    }

    /// Stop every worker and wait for them to exit.
    pub fn shutdown(&mut self) {
        self.signal.trigger();
        for (pid, handle) in self.workers.drain() {
            if handle.join().is_err() {
                warn!("Poll worker for process {} panicked", pid);
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use chrono::Local;

    use super::*;
    use crate::error::Error;

    /// Replays scripted poll results, then reports the process gone.
    struct ScriptedSource {
        pid: u32,
        script: VecDeque<Result<CharacterSnapshot>>,
    }

    fn snapshot(pid: u32) -> CharacterSnapshot {
        CharacterSnapshot {
            pid,
            captured_at: Local::now(),
            stats: None,
            position: None,
            map: None,
            pet: None,
            read_failures: 0,
        }
    }

    impl SnapshotSource for ScriptedSource {
        fn pid(&self) -> u32 {
            self.pid
        }

        fn poll(&mut self) -> Result<CharacterSnapshot> {
            self.script.pop_front().unwrap_or(Err(Error::ModuleNotFound {
                pid: self.pid,
                module: "Game.exe".to_string(),
            }))
        }
    }

    #[test]
    fn test_worker_reports_until_detached() {
        let (mut monitor, events) = Monitor::new(Duration::ZERO, Arc::new(ShutdownSignal::new()));
        let source = ScriptedSource {
            pid: 10,
            script: VecDeque::from(vec![
                Ok(snapshot(10)),
                Err(Error::NullAddress),
                Ok(snapshot(10)),
            ]),
        };
        assert!(monitor.watch(source));

        let received: Vec<PollEvent> = events.iter().take(4).collect();
        assert!(matches!(received[0], PollEvent::Snapshot(_)));
        assert!(matches!(received[1], PollEvent::Error { pid: 10, .. }));
        assert!(matches!(received[2], PollEvent::Snapshot(_)));
        match &received[3] {
            PollEvent::Detached { pid, reason } => {
                assert_eq!(*pid, 10);
                assert!(reason.contains("Game.exe"));
            }
            other => panic!("unexpected {:?}", other),
        }

        monitor.shutdown();
        assert!(!monitor.is_watching(10));
    }

    #[test]
    fn test_duplicate_pid_is_not_watched_twice() {
        let signal = Arc::new(ShutdownSignal::new());
        let (mut monitor, events) = Monitor::new(Duration::from_secs(60), Arc::clone(&signal));
        let endless = || ScriptedSource {
            pid: 20,
            script: VecDeque::from(vec![Ok(snapshot(20))]),
        };

        assert!(monitor.watch(endless()));
        assert!(!monitor.watch(endless()));
        assert_eq!(events.recv().unwrap().pid(), 20);
        assert_eq!(monitor.watched(), vec![20]);

        monitor.shutdown();
        assert!(signal.is_shutdown());
        assert!(monitor.watched().is_empty());
    }

    #[test]
    fn test_detached_pid_can_be_watched_again() {
        let (mut monitor, events) = Monitor::new(Duration::ZERO, Arc::new(ShutdownSignal::new()));
        let gone = || ScriptedSource {
            pid: 30,
            script: VecDeque::new(),
        };

        assert!(monitor.watch(gone()));
        assert!(matches!(events.recv().unwrap(), PollEvent::Detached { .. }));
        // wait for the worker thread itself to exit
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while monitor.is_watching(30) && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(monitor.watch(gone()));
    }
}
