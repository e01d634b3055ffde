//! Skill command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use oathwatch::{
    AutomationLoop, Config, ShutdownSignal, SkillKey, WindowKeyInput, find_processes, run_combo,
};

use crate::input;

pub fn run(
    config: &Config,
    pid: Option<u32>,
    slots: &[u8],
    interval_ms: u64,
    repeat: bool,
    shutdown: Arc<ShutdownSignal>,
) -> Result<()> {
    let keys = slots
        .iter()
        .map(|&slot| SkillKey::from_slot(slot))
        .collect::<oathwatch::Result<Vec<_>>>()?;
    let pid = match pid {
        Some(pid) => pid,
        None => find_processes(&config.process_name)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No {} process running", config.process_name))?,
    };
    let delay = Duration::from_millis(interval_ms);
    let combo: Vec<String> = keys.iter().map(|k| k.to_string()).collect();

    if !repeat {
        let input = WindowKeyInput::for_process(pid)?;
        let pressed = run_combo(&input, &keys, delay, &shutdown);
        println!("Pressed {}/{} key(s) on process {}", pressed, keys.len(), pid);
        return Ok(());
    }

    let _keyboard = input::spawn_keyboard_monitor(Arc::clone(&shutdown));
    let mut input = WindowKeyInput::for_process(pid)?;
    let mut automation = AutomationLoop::new(pid);
    automation.start(Duration::ZERO, move |signal| {
        if run_combo(&input, &keys, delay, signal) < keys.len() && !signal.is_shutdown() {
            // the client may have recreated its window
            input.refresh()?;
        }
        Ok(())
    });

    println!(
        "Repeating {} on process {} (Press Esc or q to stop)",
        combo.join(" "),
        pid
    );
    while !shutdown.is_shutdown() && automation.is_running() {
        shutdown.wait(Duration::from_millis(200));
    }
    automation.stop();
    println!("Stopped");
    Ok(())
}
