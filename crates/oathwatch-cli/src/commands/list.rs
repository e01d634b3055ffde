//! List command implementation.

use anyhow::Result;
use oathwatch::{Config, MemoryAccessor, ProcessHandle, SnapshotReader, find_processes};

use super::snapshot::summary_line;

pub fn run(config: &Config) -> Result<()> {
    let pids = find_processes(&config.process_name)?;
    if pids.is_empty() {
        println!("No {} processes running", config.process_name);
        return Ok(());
    }

    let scenes = config.scenes();
    let reader = SnapshotReader::new(&config.chains).with_scenes(&scenes);
    println!("{} {} process(es):", pids.len(), config.process_name);

    for pid in pids {
        match ProcessHandle::attach(pid, &config.module_name) {
            Ok(process) => {
                let snapshot = reader.capture(&MemoryAccessor::new(&process), pid);
                println!("{}", summary_line(&snapshot));
            }
            Err(e) => println!("[{:>6}] cannot attach: {}", pid, e),
        }
    }
    Ok(())
}
