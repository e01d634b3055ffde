//! Whole-process memory scans.
//!
//! Every scan walks the committed regions of the target one at a time,
//! skips regions it cannot read, and checks the cancellation signal between
//! regions and between chunks of large regions. Partial results survive a
//! cancellation.

mod pattern;
mod pointer;
mod text;
mod value;

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::{MemoryRegion, QueryRegions, ReadMemory, Regions};
use crate::shutdown::ShutdownSignal;

pub use pattern::{find_all_in_buffer, find_byte_pattern, find_in_buffer, find_pattern};
pub use pointer::find_pointers_to;
pub use text::{TextEncoding, find_ascii_string, find_text};
pub use value::{find_i32_value, narrow_i32_value};

/// Default cap on results for text and pointer scans.
pub const DEFAULT_RESULT_CAP: usize = 100;

/// Largest slice of a region read in one call.
const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// A location a scan or heuristic flagged for a human to look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCandidate {
    pub address: u64,
    /// What matched there: the pattern, string or record summary.
    pub matched: String,
    /// Higher is more plausible; only comparable within one scan.
    pub score: u32,
}

/// Results of a scan plus how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport<T> {
    pub results: Vec<T>,
    pub regions_scanned: usize,
    pub cancelled: bool,
    /// The result cap was reached; later matches were not looked for.
    pub truncated: bool,
}

impl<T> ScanReport<T> {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            regions_scanned: 0,
            cancelled: false,
            truncated: false,
        }
    }

    /// Add a result. Breaks once `cap` results are held.
    pub(crate) fn push(&mut self, item: T, cap: usize) -> ControlFlow<()> {
        if self.results.len() >= cap {
            self.truncated = true;
            return ControlFlow::Break(());
        }
        self.results.push(item);
        if self.results.len() >= cap {
            self.truncated = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    pub fn is_complete(&self) -> bool {
        !self.cancelled && !self.truncated
    }
}

impl<T> Default for ScanReport<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A window of bytes read from the target.
pub(crate) struct Chunk<'a> {
    pub base: u64,
    pub bytes: &'a [u8],
    /// Matches must start before this offset; the rest overlaps the next chunk.
    pub accept_len: usize,
}

/// Feed every readable region matching `filter` to `visit`, in chunks that
/// overlap by `overlap` bytes so matches spanning a boundary are seen once.
pub(crate) fn scan_regions<R, F, V, T>(
    reader: &R,
    filter: F,
    overlap: usize,
    signal: &ShutdownSignal,
    report: &mut ScanReport<T>,
    mut visit: V,
) where
    R: ReadMemory + QueryRegions + ?Sized,
    F: Fn(&MemoryRegion) -> bool,
    V: FnMut(&Chunk<'_>, &mut ScanReport<T>) -> ControlFlow<()>,
{
    for region in Regions::new(reader) {
        if signal.is_shutdown() {
            report.cancelled = true;
            return;
        }
        if !region.is_readable() || !filter(&region) {
            continue;
        }

        report.regions_scanned += 1;
        let mut offset = 0u64;
        while offset < region.size {
            if signal.is_shutdown() {
                report.cancelled = true;
                return;
            }

            let remaining = (region.size - offset) as usize;
            let accept_len = remaining.min(CHUNK_SIZE);
            let read_len = remaining.min(CHUNK_SIZE + overlap);
            let base = region.base + offset;

            match reader.read_bytes(base, read_len) {
                Ok(bytes) => {
                    let chunk = Chunk {
                        base,
                        bytes: &bytes,
                        accept_len,
                    };
                    if visit(&chunk, report).is_break() {
                        return;
                    }
                }
                Err(e) => {
                    debug!("Skipping unreadable chunk at {:#x}: {}", base, e);
                }
            }
            offset += accept_len as u64;
        }
    }
}
