use std::ops::ControlFlow;

use memchr::memmem;
use tracing::info;

use super::{ScanCandidate, ScanReport, scan_regions};
use crate::memory::layout::limits::STATIC_ADDRESS_CEILING;
use crate::memory::{QueryRegions, ReadMemory};
use crate::shutdown::ShutdownSignal;

/// Find every 4-byte-aligned dword in read/write memory equal to `target`.
///
/// Pointers in the client are 32-bit, so `target` is too.
///
/// Hits below [`STATIC_ADDRESS_CEILING`] are likely module-static and score
/// higher; they are the useful roots when walking back toward a chain head.
pub fn find_pointers_to<R: ReadMemory + QueryRegions + ?Sized>(
    reader: &R,
    target: u32,
    cap: usize,
    signal: &ShutdownSignal,
) -> ScanReport<ScanCandidate> {
    let needle = target.to_le_bytes();
    let finder = memmem::Finder::new(&needle);
    let matched = format!("-> {:#010x}", target);
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
                    let score = if address < STATIC_ADDRESS_CEILING { 2 } else { 1 };
                    let candidate = ScanCandidate {
                        address,
                        matched: matched.clone(),
                        score,
                    };
                    report.push(candidate, cap)?;
                }
                start = offset + 1;
            }
            ControlFlow::Continue(())
        },
    );

    info!(
        "Pointer scan for {:#x}: {} reference(s) in {} region(s)",
        target,
        report.results.len(),
        report.regions_scanned
    );
    report
}
