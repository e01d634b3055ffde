//! Fields command implementation.

use std::ops::RangeInclusive;

use anyhow::{Context, Result};
use oathwatch::debug::{FieldKind, FieldRange, dump_fields};
use oathwatch::{ChainKind, Config, MemoryAccessor, ShutdownSignal};

use super::attach;
use crate::cli::FieldType;

impl From<FieldType> for FieldKind {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Int => FieldKind::Int,
            FieldType::Float => FieldKind::Float,
            FieldType::String => FieldKind::String,
        }
    }
}

pub fn run(
    config: &Config,
    pid: Option<u32>,
    chain: &str,
    offsets: RangeInclusive<u64>,
    step: u64,
    kind: FieldType,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let chain_kind: ChainKind = chain
        .parse()
        .with_context(|| format!("Unknown chain {} (entity, stats, map, legacy-map, pet)", chain))?;
    let chain = config.chains.get(chain_kind);

    let process = attach(config, pid)?;
    let reader = MemoryAccessor::new(&process);
    let base = chain
        .resolve(&reader)
        .with_context(|| format!("{} chain {} did not resolve", chain_kind, chain))?;

    let kind = FieldKind::from(kind);
    let range = FieldRange {
        from: *offsets.start(),
        to: *offsets.end(),
        step,
    };
    println!(
        "{} base 0x{:08X}: {} fields +{}..=+{} step {}",
        chain_kind, base, kind, range.from, range.to, range.step
    );
    println!();

    let report = dump_fields(&reader, base, range, kind, shutdown);
    for entry in &report.results {
        println!("  {}", entry);
    }
    println!();
    println!(
        "{} non-empty field(s){}",
        report.results.len(),
        if report.truncated { " (limit reached)" } else { "" }
    );
    Ok(())
}
