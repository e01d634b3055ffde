//! Watch command implementation.

use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use anyhow::Result;
use oathwatch::{Config, Monitor, MonitorTarget, PollEvent, ProcessSource, ShutdownSignal};
use tracing::{info, warn};

use super::snapshot::summary_line;
use crate::input;

pub fn run(config: &Config, pid: Option<u32>, shutdown: Arc<ShutdownSignal>) -> Result<()> {
    let _keyboard = input::spawn_keyboard_monitor(Arc::clone(&shutdown));
    let target = MonitorTarget::from_config(config);
    let (mut monitor, events) = Monitor::new(config.poll_interval(), Arc::clone(&shutdown));

    // With --pid only that client is watched; otherwise new clients are picked up as they start
    let discover = pid.is_none();
    if let Some(pid) = pid {
        monitor.watch(ProcessSource::attach(pid, &target)?);
    }
    let mut next_discovery = Instant::now();

    println!("Watching... (Press Esc or q to quit)");
    while !shutdown.is_shutdown() {
        if discover && Instant::now() >= next_discovery {
            let attached = monitor.discover(&target);
            if !attached.is_empty() {
                info!("Attached to {:?}", attached);
            }
            next_discovery = Instant::now() + config.discovery_interval();
        }

        match events.recv_timeout(Duration::from_millis(200)) {
            Ok(PollEvent::Snapshot(snapshot)) => println!("{}", summary_line(&snapshot)),
            Ok(PollEvent::Detached { pid, reason }) => {
                println!("[{:>6}] detached: {}", pid, reason);
                if !discover {
                    break;
                }
            }
            Ok(PollEvent::Error { pid, message }) => warn!("Poll of {} failed: {}", pid, message),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    monitor.shutdown();
    Ok(())
}
