//! Chain recovery for when a game update moves the static heads
//!
//! Everything here is a diagnostic: slow, read-only, and never on the polling
//! path. Each scan checks the cancellation signal between candidates.

mod constants;
mod utils;
mod validation;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::memory::ReadMemory;
use crate::offset::{PointerChain, walk};
use crate::scan::{ScanCandidate, ScanReport};
use crate::shutdown::ShutdownSignal;

pub use constants::*;
pub use utils::{aligned_steps, is_plausible_user_address, is_static_address, is_valid_name};
pub use validation::{
    Rejection, StatsSample, check_stats_record, validate_stats_record,
};

/// A module-relative span of candidate chain heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRange {
    pub start: u64,
    pub len: u64,
}

impl ScanRange {
    pub fn heads(&self) -> impl Iterator<Item = u64> {
        aligned_steps(self.start, self.len, POINTER_ALIGN)
    }
}

/// Settings for [`scan_for_candidate_bases`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseScan {
    /// Offsets walked after the candidate head; the stats chain tail.
    pub tail: Vec<i64>,
    pub ranges: Vec<ScanRange>,
}

impl Default for BaseScan {
    fn default() -> Self {
        Self {
            tail: vec![12, 340, 4],
            ranges: DEFAULT_BASE_SCAN_STARTS
                .iter()
                .map(|&start| ScanRange {
                    start,
                    len: DEFAULT_BASE_SCAN_LEN,
                })
                .collect(),
        }
    }
}

/// Outcome of resolving one chain with the user-range check on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainProbe {
    /// 0 when the walk broke.
    pub resolved: u64,
    pub plausible: bool,
}

impl ChainProbe {
    pub fn is_ok(&self) -> bool {
        self.resolved != 0 && self.plausible
    }
}

/// Resolve `chain` and reject results outside the 32-bit user range.
pub fn test_chain<R: ReadMemory + ?Sized>(reader: &R, chain: &PointerChain) -> ChainProbe {
    let resolved = chain.follow(reader);
    let plausible = resolved != 0 && is_plausible_user_address(resolved);
    if resolved == 0 {
        debug!("Chain failed: {}", chain);
    } else if !plausible {
        debug!("Chain {} returned invalid address {:#x}", chain, resolved);
    } else {
        debug!("Chain {} -> {:#x}", chain, resolved);
    }
    ChainProbe {
        resolved,
        plausible,
    }
}

fn probe_at<R: ReadMemory + ?Sized>(reader: &R, start: u64, tail: &[i64]) -> Option<u64> {
    walk(reader, start, tail)
        .ok()
        .filter(|&address| is_plausible_user_address(address))
}

/// Brute-force the head of the stats chain.
///
/// Every 4-byte-aligned head in each range is walked with `scan.tail`; heads
/// whose record passes [`validate_stats_record`] are returned. A candidate's
/// `address` is the module-relative head, ready to drop into a chain.
pub fn scan_for_candidate_bases<R: ReadMemory + ?Sized>(
    reader: &R,
    scan: &BaseScan,
    signal: &ShutdownSignal,
) -> ScanReport<ScanCandidate> {
    let mut report = ScanReport::new();
    let module_base = reader.base_address();

    'ranges: for range in &scan.ranges {
        info!(
            "Scanning heads {:#x}..{:#x}",
            range.start,
            range.start.saturating_add(range.len)
        );
        for head in range.heads() {
            if signal.is_shutdown() {
                report.cancelled = true;
                break 'ranges;
            }
            let Some(record) = probe_at(reader, module_base.wrapping_add(head), &scan.tail) else {
                continue;
            };
            if let Ok(sample) = check_stats_record(reader, record) {
                info!("Candidate head {:#x} ({}): {}", head, head, sample.summary());
                report.results.push(ScanCandidate {
                    address: head,
                    matched: sample.summary(),
                    score: sample.score(),
                });
            }
        }
        report.regions_scanned += 1;
    }

    if report.results.is_empty() && !report.cancelled {
        info!("No valid heads found; the character may not be logged in");
    }
    report
}

/// A chain that leads to something holding a plausible map id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapChainCandidate {
    pub chain: PointerChain,
    pub target: u64,
    pub map_offset: u64,
    pub map_id: i32,
}

/// First probe offset at `base` holding an id in `MIN_MAP_ID..=MAX_MAP_ID`.
pub fn probe_map_data<R: ReadMemory + ?Sized>(reader: &R, base: u64) -> Option<(u64, i32)> {
    MAP_ID_PROBE_OFFSETS.iter().find_map(|&offset| {
        let id = reader.read_i32(base.wrapping_add(offset)).ok()?;
        (MIN_MAP_ID..=MAX_MAP_ID)
            .contains(&id)
            .then_some((offset, id))
    })
}

/// Try map chain shapes around a known working head.
///
/// Pattern 1 is `[head, o]`, pattern 2 `[head, 12, o]`, pattern 3
/// `[head + d, 12]` for `d` within ±[`MAP_NEIGHBOUR_RADIUS`].
pub fn scan_for_map_chains<R: ReadMemory + ?Sized>(
    reader: &R,
    head: i64,
    signal: &ShutdownSignal,
) -> ScanReport<MapChainCandidate> {
    let mut candidates: Vec<Vec<i64>> = Vec::new();
    candidates.extend(MAP_DIRECT_OFFSETS.iter().map(|&o| vec![head, o]));
    candidates.extend(
        MAP_NESTED_OFFSETS
            .iter()
            .map(|&o| vec![head, MAP_ENTITY_OFFSET, o]),
    );

    let mut report = ScanReport::new();
    for offsets in candidates {
        if signal.is_shutdown() {
            report.cancelled = true;
            return report;
        }
        try_map_chain(reader, offsets, &mut report);
    }
    report.regions_scanned += 1;

    let mut delta = -MAP_NEIGHBOUR_RADIUS;
    while delta <= MAP_NEIGHBOUR_RADIUS {
        if signal.is_shutdown() {
            report.cancelled = true;
            return report;
        }
        // d = 0 repeats pattern 1
        if delta != 0 {
            try_map_chain(reader, vec![head + delta, MAP_ENTITY_OFFSET], &mut report);
        }
        delta += POINTER_ALIGN as i64;
    }
    report.regions_scanned += 1;

    info!("Map chain scan found {} candidate(s)", report.results.len());
    report
}

fn try_map_chain<R: ReadMemory + ?Sized>(
    reader: &R,
    offsets: Vec<i64>,
    report: &mut ScanReport<MapChainCandidate>,
) {
    let Ok(chain) = PointerChain::new(offsets) else {
        return;
    };
    let probe = test_chain(reader, &chain);
    if !probe.is_ok() {
        return;
    }
    if let Some((map_offset, map_id)) = probe_map_data(reader, probe.resolved) {
        info!("Map chain {} -> map id {} at +{}", chain, map_id, map_offset);
        report.results.push(MapChainCandidate {
            chain,
            target: probe.resolved,
            map_offset,
            map_id,
        });
    }
}
