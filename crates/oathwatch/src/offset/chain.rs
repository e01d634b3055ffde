use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

/// Ordered offsets walked through successive 32-bit pointer dereferences.
///
/// `chain[0]` is relative to the module base. Each later offset is added to
/// the previously dereferenced pointer. The result is a record base; field
/// offsets are applied by the caller. Every chain dereferences at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct PointerChain(Vec<i64>);

/// One dereference of a chain walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainStep {
    pub address: u64,
    /// `None` when the read itself failed.
    pub pointer: Option<u64>,
}

impl PointerChain {
    pub fn new(offsets: Vec<i64>) -> Result<Self> {
        if offsets.is_empty() {
            return Err(Error::InvalidChain("chain has no offsets".to_string()));
        }
        Ok(Self(offsets))
    }

    /// Built-in chains; callers guarantee a non-empty slice.
    pub(crate) fn literal(offsets: &[i64]) -> Self {
        debug_assert!(!offsets.is_empty());
        Self(offsets.to_vec())
    }

    pub fn offsets(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Module-relative start offset.
    pub fn head(&self) -> i64 {
        self.0[0]
    }

    /// Offsets applied after the first dereference.
    pub fn tail(&self) -> &[i64] {
        &self.0[1..]
    }

    /// Same tail, different module-relative start.
    pub fn with_head(&self, head: i64) -> Self {
        let mut offsets = self.0.clone();
        offsets[0] = head;
        Self(offsets)
    }

    /// Walk the chain against a fresh module base.
    ///
    /// Fails with [`Error::ChainBroken`] at the first zero pointer without
    /// issuing any further reads.
    pub fn resolve<R: ReadMemory + ?Sized>(&self, reader: &R) -> Result<u64> {
        let start = reader.base_address().wrapping_add_signed(self.head());
        walk(reader, start, self.tail())
    }

    /// [`resolve`](Self::resolve) with 0 as the failure sentinel.
    pub fn follow<R: ReadMemory + ?Sized>(&self, reader: &R) -> u64 {
        match self.resolve(reader) {
            Ok(address) => address,
            Err(e) => {
                debug!("Chain {} unresolved: {}", self, e);
                0
            }
        }
    }

    /// Record every dereference until the walk ends, for diagnostics.
    pub fn trace<R: ReadMemory + ?Sized>(&self, reader: &R) -> Vec<ChainStep> {
        let mut steps = Vec::with_capacity(self.len());
        let mut address = reader.base_address().wrapping_add_signed(self.head());

        for (index, offset) in self.0.iter().enumerate() {
            if index > 0 {
                let Some(Some(previous)) = steps.last().map(|s: &ChainStep| s.pointer) else {
                    break;
                };
                address = previous.wrapping_add_signed(*offset);
            }
            let pointer = reader.read_pointer(address).ok();
            steps.push(ChainStep { address, pointer });
            if matches!(pointer, None | Some(0)) {
                break;
            }
        }
        steps
    }
}

/// Dereference `start`, then apply each offset and dereference again.
///
/// Used directly by brute-force scans, where the first address is a
/// candidate rather than module base + offset.
pub fn walk<R: ReadMemory + ?Sized>(reader: &R, start: u64, offsets: &[i64]) -> Result<u64> {
    let mut pointer = deref(reader, 0, start)?;
    for (index, offset) in offsets.iter().enumerate() {
        let address = pointer.wrapping_add_signed(*offset);
        pointer = deref(reader, index + 1, address)?;
    }
    Ok(pointer)
}

fn deref<R: ReadMemory + ?Sized>(reader: &R, step: usize, address: u64) -> Result<u64> {
    let pointer = reader.read_pointer(address)?;
    if pointer == 0 {
        return Err(Error::ChainBroken { step, address });
    }
    Ok(pointer)
}

impl TryFrom<Vec<i64>> for PointerChain {
    type Error = Error;

    fn try_from(offsets: Vec<i64>) -> Result<Self> {
        Self::new(offsets)
    }
}

impl From<PointerChain> for Vec<i64> {
    fn from(chain: PointerChain) -> Self {
        chain.0
    }
}

impl fmt::Display for PointerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|o| o.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Parses `"2381824, 12, 0x154"`; brackets are optional, hex needs `0x`.
impl FromStr for PointerChain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let inner = s.trim().trim_start_matches('[').trim_end_matches(']');
        let offsets = inner
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(parse_offset)
            .collect::<Result<Vec<_>>>()?;
        Self::new(offsets)
    }
}

fn parse_offset(token: &str) -> Result<i64> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    }
    .map_err(|e| Error::InvalidChain(format!("bad offset '{}': {}", token, e)))?;
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MOCK_MODULE_BASE, MockMemoryBuilder};

    const STATS_CHAIN: [i64; 4] = [2381824, 12, 340, 4];

    fn chain(offsets: &[i64]) -> PointerChain {
        PointerChain::new(offsets.to_vec()).unwrap()
    }

    #[test]
    fn test_follow_walks_every_step() {
        let head = MOCK_MODULE_BASE + 2381824;
        let memory = MockMemoryBuilder::new()
            .readonly(head, 4)
            .pointer_at(head, 0x0100_0000)
            .writable(0x0100_0000, 0x200)
            .pointer_at(0x0100_000C, 0x0200_0000)
            .writable(0x0200_0000, 0x200)
            .pointer_at(0x0200_0154, 0x0300_0000)
            .writable(0x0300_0000, 0x10)
            .pointer_at(0x0300_0004, 0x0500_0000)
            .build();

        assert_eq!(chain(&STATS_CHAIN).follow(&memory), 0x0500_0000);
        assert_eq!(memory.read_count(), 4);
    }

    #[test]
    fn test_zero_pointer_short_circuits() {
        let head = MOCK_MODULE_BASE + 2381824;
        let memory = MockMemoryBuilder::new()
            .readonly(head, 4)
            .pointer_at(head, 0x0100_0000)
            .writable(0x0100_0000, 0x200)
            // 0x0100_000C holds 0
            .build();

        let result = chain(&STATS_CHAIN).resolve(&memory);
        assert!(matches!(
            result,
            Err(Error::ChainBroken {
                step: 1,
                address: 0x0100_000C
            })
        ));
        assert_eq!(memory.read_count(), 2);

        memory.reset_read_count();
        assert_eq!(chain(&STATS_CHAIN).follow(&memory), 0);
        assert_eq!(memory.read_count(), 2);
    }

    #[test]
    fn test_zero_at_head_reads_once() {
        let memory = MockMemoryBuilder::new()
            .readonly(MOCK_MODULE_BASE, 0x0030_0000)
            .build();
        assert_eq!(chain(&STATS_CHAIN).follow(&memory), 0);
        assert_eq!(memory.read_count(), 1);
    }

    #[test]
    fn test_single_offset_chain_still_dereferences() {
        let memory = MockMemoryBuilder::new()
            .readonly(MOCK_MODULE_BASE + 0x10, 4)
            .pointer_at(MOCK_MODULE_BASE + 0x10, 0x00AB_CDEF)
            .build();
        assert_eq!(chain(&[0x10]).follow(&memory), 0x00AB_CDEF);
        assert_eq!(memory.read_count(), 1);
    }

    #[test]
    fn test_negative_offsets_wrap() {
        let memory = MockMemoryBuilder::new()
            .readonly(0x1000, 0x100)
            .pointer_at(0x1000, 0x1080)
            .pointer_at(0x1070, 0x4242)
            .base(0x1010)
            .build();
        assert_eq!(chain(&[-0x10, -0x10]).follow(&memory), 0x4242);
    }

    #[test]
    fn test_trace_stops_at_break() {
        let head = MOCK_MODULE_BASE + 100;
        let memory = MockMemoryBuilder::new()
            .readonly(head, 4)
            .pointer_at(head, 0x2000)
            .readonly(0x2000, 0x10)
            .build();
        let steps = chain(&[100, 8, 4]).trace(&memory);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].pointer, Some(0x2000));
        assert_eq!(steps[1].address, 0x2008);
        assert_eq!(steps[1].pointer, Some(0));
    }

    #[test]
    fn test_parse_and_display() {
        let parsed: PointerChain = "[2381824, 12, 0x154, -4]".parse().unwrap();
        assert_eq!(parsed.offsets(), &[2381824, 12, 340, -4]);
        assert_eq!(parsed.to_string(), "[2381824, 12, 340, -4]");
        assert!("".parse::<PointerChain>().is_err());
        assert!("12, zz".parse::<PointerChain>().is_err());
    }

    #[test]
    fn test_empty_chain_rejected_by_serde() {
        let result: std::result::Result<PointerChain, _> = serde_json::from_str("[]");
        assert!(result.is_err());
        let ok: PointerChain = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(ok.tail(), &[2]);
    }
}
