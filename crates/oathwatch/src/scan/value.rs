use std::ops::ControlFlow;

use memchr::memmem;
use tracing::info;

use super::{ScanReport, scan_regions};
use crate::memory::{QueryRegions, ReadMemory};
use crate::shutdown::ShutdownSignal;

/// First pass of a value hunt: every aligned `i32` in writable memory equal to `value`.
pub fn find_i32_value<R: ReadMemory + QueryRegions + ?Sized>(
    reader: &R,
    value: i32,
    cap: usize,
    signal: &ShutdownSignal,
) -> ScanReport<u64> {
    let needle = value.to_le_bytes();
    let finder = memmem::Finder::new(&needle);
    let mut report = ScanReport::new();

    scan_regions(
        reader,
        |region| region.is_writable(),
        0,
        signal,
        &mut report,
        |chunk, report| {
            let mut start = 0;
            while let Some(found) = finder.find(&chunk.bytes[start..]) {
                let offset = start + found;
                if offset >= chunk.accept_len {
                    break;
                }
                let address = chunk.base + offset as u64;
                if address % 4 == 0 {
                    report.push(address, cap)?;
                }
                start = offset + 1;
            }
            ControlFlow::Continue(())
        },
    );

    info!(
        "Value scan for {}: {} address(es) in {} region(s)",
        value,
        report.results.len(),
        report.regions_scanned
    );
    report
}

/// Keep the addresses from an earlier pass that now hold `value`.
pub fn narrow_i32_value<R: ReadMemory + ?Sized>(
    reader: &R,
    previous: &[u64],
    value: i32,
) -> Vec<u64> {
    let kept: Vec<u64> = previous
        .iter()
        .copied()
        .filter(|&address| reader.read_i32(address).is_ok_and(|v| v == value))
        .collect();
    info!("Narrowed {} address(es) to {}", previous.len(), kept.len());
    kept
}
