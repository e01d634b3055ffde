use std::ops::ControlFlow;

use tracing::{debug, info};

use super::{ScanCandidate, ScanReport, scan_regions};
use crate::memory::{QueryRegions, ReadMemory};
use crate::offset::Signature;
use crate::shutdown::ShutdownSignal;

/// Offset of the first match of `signature` in `buffer`.
pub fn find_in_buffer(buffer: &[u8], signature: &Signature) -> Option<usize> {
    find_all_in_buffer(buffer, signature, buffer.len()).next()
}

/// Every match starting before `limit`, in order.
///
/// Candidate positions come from `memchr` on the first concrete byte, so a
/// leading wildcard costs nothing extra.
pub fn find_all_in_buffer<'a>(
    buffer: &'a [u8],
    signature: &'a Signature,
    limit: usize,
) -> impl Iterator<Item = usize> + 'a {
    let pattern = signature.bytes();
    let anchor = pattern.iter().position(Option::is_some);
    let last_start = buffer.len().checked_sub(pattern.len());

    let starts: Box<dyn Iterator<Item = usize> + 'a> = match (anchor, last_start) {
        (_, None) => Box::new(std::iter::empty()),
        (None, Some(last)) => Box::new(0..=last),
        (Some(index), Some(_)) => {
            let byte = pattern[index].unwrap_or_default();
            // A hit at `p` in the shifted slice means a match starting at `p`.
            Box::new(memchr::memchr_iter(byte, &buffer[index..]))
        }
    };

    starts
        .take_while(move |&start| start < limit && last_start.is_some_and(|last| start <= last))
        .filter(move |&start| signature.matches(&buffer[start..]))
}

/// Search one region for `signature`; `None` if absent or unreadable.
pub fn find_byte_pattern<R: ReadMemory + ?Sized>(
    reader: &R,
    region_base: u64,
    region_size: usize,
    signature: &Signature,
) -> Option<u64> {
    let buffer = match reader.read_bytes(region_base, region_size) {
        Ok(buffer) => buffer,
        Err(e) => {
            debug!("Pattern region {:#x} unreadable: {}", region_base, e);
            return None;
        }
    };
    find_in_buffer(&buffer, signature).map(|offset| region_base + offset as u64)
}

/// Search every readable region for `signature`.
pub fn find_pattern<R: ReadMemory + QueryRegions + ?Sized>(
    reader: &R,
    signature: &Signature,
    cap: usize,
    signal: &ShutdownSignal,
) -> ScanReport<ScanCandidate> {
    let mut report = ScanReport::new();
    let matched = signature.to_string();
    let overlap = signature.len().saturating_sub(1);

    scan_regions(reader, |_| true, overlap, signal, &mut report, |chunk, report| {
        for offset in find_all_in_buffer(chunk.bytes, signature, chunk.accept_len) {
            let candidate = ScanCandidate {
                address: chunk.base + offset as u64,
                matched: matched.clone(),
                score: 1,
            };
            report.push(candidate, cap)?;
        }
        ControlFlow::Continue(())
    });

    info!(
        "Pattern scan for {}: {} match(es) in {} region(s)",
        matched,
        report.results.len(),
        report.regions_scanned
    );
    report
}
