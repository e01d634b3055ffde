//! CLI command implementations.

pub mod diagnose;
pub mod fields;
pub mod find;
pub mod hex_utils;
pub mod hexdump;
pub mod init_config;
pub mod list;
pub mod poke;
pub mod scan;
pub mod skill;
pub mod snapshot;
pub mod watch;

use anyhow::Result;
use oathwatch::{Config, ProcessHandle};

/// Attach to `pid`, or to the first process named in the config.
pub fn attach(config: &Config, pid: Option<u32>) -> Result<ProcessHandle> {
    let process = match pid {
        Some(pid) => ProcessHandle::attach(pid, &config.module_name)?,
        None => ProcessHandle::find_and_attach(&config.process_name, &config.module_name)?,
    };
    println!(
        "Found process (PID: {}, {} base: 0x{:X})",
        process.pid, process.module_name, process.base_address
    );
    Ok(process)
}
