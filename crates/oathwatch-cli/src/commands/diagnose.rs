//! Diagnose command implementation.

use std::path::Path;

use anyhow::Result;
use oathwatch::{Config, DiagnosticReport, MemoryAccessor};

use super::attach;

pub fn run(config: &Config, pid: Option<u32>, json: bool, output: Option<&Path>) -> Result<()> {
    let process = attach(config, pid)?;
    let reader = MemoryAccessor::new(&process);
    let report = DiagnosticReport::generate(&reader, process.pid, &config.chains);

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!();
        println!("{}", report);
    }

    if let Some(path) = output {
        report.save(path)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}
