//! Memory search commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use oathwatch::scan::{
    find_byte_pattern, find_i32_value, find_pattern, find_pointers_to, find_text, narrow_i32_value,
};
use oathwatch::{Config, MemoryAccessor, ScanCandidate, ScanReport, ShutdownSignal, Signature, TextEncoding};

use super::attach;
use super::hex_utils::{parse_hex_address, parse_pointer, parse_span};

/// Addresses printed before the rest are summarised.
const SHOWN: usize = 50;

fn print_candidates(report: &ScanReport<ScanCandidate>) {
    if report.cancelled {
        println!("Scan cancelled; showing partial results");
    }
    println!(
        "Found {} match(es) in {} region(s){}",
        report.results.len(),
        report.regions_scanned,
        if report.truncated { " (limit reached)" } else { "" }
    );
    for candidate in &report.results {
        println!(
            "  0x{:08X}  score {}  {}",
            candidate.address, candidate.score, candidate.matched
        );
    }
}

pub fn text(
    config: &Config,
    pid: Option<u32>,
    text: &str,
    encoding: &str,
    limit: Option<usize>,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let encoding: TextEncoding = encoding
        .parse()
        .with_context(|| format!("Unknown encoding {} (ascii, utf16, viscii)", encoding))?;
    let process = attach(config, pid)?;
    let reader = MemoryAccessor::new(&process);

    println!("Searching for {:?} as {}...", text, encoding);
    let report = find_text(
        &reader,
        text,
        encoding,
        limit.unwrap_or(config.scan.result_cap),
        shutdown,
    )?;
    print_candidates(&report);
    Ok(())
}

pub fn pointers(
    config: &Config,
    pid: Option<u32>,
    address: &str,
    limit: Option<usize>,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let target = parse_pointer(address)?;
    let process = attach(config, pid)?;
    let reader = MemoryAccessor::new(&process);

    println!("Searching for pointers to 0x{:X}...", target);
    let report = find_pointers_to(
        &reader,
        target,
        limit.unwrap_or(config.scan.result_cap),
        shutdown,
    );
    print_candidates(&report);
    Ok(())
}

pub fn pattern(
    config: &Config,
    pid: Option<u32>,
    pattern: &str,
    region: Option<&str>,
    limit: Option<usize>,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let signature: Signature = pattern.parse()?;
    let process = attach(config, pid)?;
    let reader = MemoryAccessor::new(&process);

    if let Some(region) = region {
        let (base, len) = parse_span(region, parse_hex_address)?;
        match find_byte_pattern(&reader, base, len as usize, &signature) {
            Some(address) => println!("Found {} at 0x{:08X}", signature, address),
            None => println!(
                "{} not found in 0x{:X}..0x{:X}",
                signature,
                base,
                base.saturating_add(len)
            ),
        }
        return Ok(());
    }

    println!("Searching for {}...", signature);
    let report = find_pattern(
        &reader,
        &signature,
        limit.unwrap_or(config.scan.result_cap),
        shutdown,
    );
    print_candidates(&report);
    Ok(())
}

pub fn value(
    config: &Config,
    pid: Option<u32>,
    value: i32,
    save: Option<&Path>,
    narrow: Option<&Path>,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let process = attach(config, pid)?;
    let reader = MemoryAccessor::new(&process);

    let addresses = match narrow {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            let previous: Vec<u64> = serde_json::from_str(&content)?;
            println!("Re-checking {} address(es) for {}...", previous.len(), value);
            narrow_i32_value(&reader, &previous, value)
        }
        None => {
            println!("Searching writable memory for {}...", value);
            let report = find_i32_value(&reader, value, config.scan.value_cap, shutdown);
            if report.cancelled {
                println!("Scan cancelled; showing partial results");
            }
            if report.truncated {
                println!("Limit of {} reached; narrow before trusting the list", config.scan.value_cap);
            }
            report.results
        }
    };

    println!("{} address(es) hold {}", addresses.len(), value);
    for address in addresses.iter().take(SHOWN) {
        println!("  0x{:08X}", address);
    }
    if addresses.len() > SHOWN {
        println!("  ... and {} more", addresses.len() - SHOWN);
    }

    if let Some(path) = save {
        fs::write(path, serde_json::to_string(&addresses)?)?;
        println!("Saved to {}", path.display());
    }
    if narrow.is_none() && save.is_some() && addresses.len() > 1 {
        println!("Change the value in game, then run again with --narrow");
    }
    Ok(())
}
