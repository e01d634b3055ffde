//! Chain recovery commands: brute-force stats heads and map chain search.

use std::path::Path;

use anyhow::{Context, Result};
use oathwatch::offset::searcher::{ScanRange, scan_for_candidate_bases, scan_for_map_chains};
use oathwatch::{Config, MemoryAccessor, ShutdownSignal};

use super::attach;
use super::hex_utils::{parse_number, parse_span};

fn parse_ranges(ranges: &[String]) -> Result<Vec<ScanRange>> {
    ranges
        .iter()
        .map(|r| {
            let (start, len) = parse_span(r, parse_number)?;
            Ok(ScanRange { start, len })
        })
        .collect()
}

pub fn bases(
    config: &Config,
    config_path: &Path,
    pid: Option<u32>,
    ranges: &[String],
    apply: bool,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let mut scan = config.scan.bases.clone();
    if !ranges.is_empty() {
        scan.ranges = parse_ranges(ranges)?;
    }

    let process = attach(config, pid)?;
    let reader = MemoryAccessor::new(&process);
    println!(
        "Scanning {} range(s) with tail {:?} (Ctrl+C to stop)...",
        scan.ranges.len(),
        scan.tail
    );

    let report = scan_for_candidate_bases(&reader, &scan, shutdown);
    let mut candidates = report.results;
    candidates.sort_by(|a, b| b.score.cmp(&a.score).then(a.address.cmp(&b.address)));

    if report.cancelled {
        println!("Scan cancelled; showing partial results");
    }
    if candidates.is_empty() {
        println!("No valid heads found. Is a character logged in?");
        return Ok(());
    }

    println!();
    println!("{} candidate(s):", candidates.len());
    for candidate in &candidates {
        println!(
            "  {} (0x{:X})  score {}  {}",
            candidate.address, candidate.address, candidate.score, candidate.matched
        );
    }

    if apply {
        let head = i64::try_from(candidates[0].address).context("head out of range")?;
        let mut updated = config.clone();
        updated.chains.stats = config.chains.stats.with_head(head);
        updated.chains.entity = config.chains.entity.with_head(head);
        updated.save(config_path)?;
        println!();
        println!(
            "Updated stats chain to {} and entity chain to {} in {}",
            updated.chains.stats,
            updated.chains.entity,
            config_path.display()
        );
    }
    Ok(())
}

pub fn map(
    config: &Config,
    pid: Option<u32>,
    head: Option<&str>,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let head = match head {
        Some(h) => i64::try_from(parse_number(h)?).context("head out of range")?,
        None => config.chains.stats.head(),
    };

    let process = attach(config, pid)?;
    let reader = MemoryAccessor::new(&process);
    println!("Searching map chains around head {} (Ctrl+C to stop)...", head);

    let report = scan_for_map_chains(&reader, head, shutdown);
    if report.cancelled {
        println!("Scan cancelled; showing partial results");
    }
    if report.results.is_empty() {
        println!("No map chain candidates found");
        return Ok(());
    }

    let scenes = config.scenes();
    println!();
    for candidate in &report.results {
        let name = if scenes.is_empty() {
            String::new()
        } else {
            format!(" ({})", scenes.name(candidate.map_id))
        };
        println!(
            "  {:<28} -> 0x{:08X}  map id {} at +{}{}",
            candidate.chain.to_string(),
            candidate.target,
            candidate.map_id,
            candidate.map_offset,
            name
        );
    }
    Ok(())
}
