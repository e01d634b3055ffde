//! Sparse fake address space for tests.

use std::cell::{Cell, RefCell};
use std::ops::Range;

use super::reader::{ReadMemory, WriteMemory};
use super::region::{MemoryRegion, QueryRegions, protect};
use crate::error::{Error, Result};
use crate::shutdown::ShutdownSignal;

pub const MOCK_MODULE_BASE: u64 = 0x0040_0000;

struct MockRegion {
    base: u64,
    protection: u32,
    data: RefCell<Vec<u8>>,
}

impl MockRegion {
    fn end(&self) -> u64 {
        self.base + self.data.borrow().len() as u64
    }

    fn describe(&self) -> MemoryRegion {
        MemoryRegion {
            base: self.base,
            size: self.data.borrow().len() as u64,
            protection: self.protection,
            committed: true,
        }
    }
}

/// A fake process: disjoint regions, a module base, and a read-call counter.
pub struct MockMemory {
    base: u64,
    regions: Vec<MockRegion>,
    reads: Cell<usize>,
}

impl MockMemory {
    /// Number of `read_bytes` calls that reached the fake address space.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    pub fn reset_read_count(&self) {
        self.reads.set(0);
    }

    fn region_for(&self, address: u64, size: usize) -> Option<&MockRegion> {
        self.regions
            .iter()
            .find(|r| address >= r.base && address.saturating_add(size as u64) <= r.end())
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.reads.set(self.reads.get() + 1);
        let region = self
            .region_for(address, size)
            .filter(|r| r.describe().is_readable())
            .ok_or_else(|| Error::MemoryReadFailed {
                address,
                message: "unmapped".to_string(),
            })?;
        let start = (address - region.base) as usize;
        Ok(region.data.borrow()[start..start + size].to_vec())
    }

    fn base_address(&self) -> u64 {
        self.base
    }
}

impl WriteMemory for MockMemory {
    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        let region = self
            .region_for(address, data.len())
            .filter(|r| r.describe().is_writable())
            .ok_or_else(|| Error::MemoryWriteFailed {
                address,
                message: "not writable".to_string(),
            })?;
        let start = (address - region.base) as usize;
        region.data.borrow_mut()[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl QueryRegions for MockMemory {
    fn query_region(&self, address: u64) -> Option<MemoryRegion> {
        self.regions
            .iter()
            .find(|r| r.end() > address)
            .map(MockRegion::describe)
    }
}

/// Fires `signal` once any read touches `trigger`, to cancel a scan midway.
pub struct CancelOnRead {
    pub memory: MockMemory,
    pub signal: ShutdownSignal,
    pub trigger: Range<u64>,
}

impl CancelOnRead {
    pub fn new(memory: MockMemory, trigger: Range<u64>) -> Self {
        Self {
            memory,
            signal: ShutdownSignal::new(),
            trigger,
        }
    }
}

impl ReadMemory for CancelOnRead {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let bytes = self.memory.read_bytes(address, size);
        if self.trigger.contains(&address) {
            self.signal.trigger();
        }
        bytes
    }

    fn base_address(&self) -> u64 {
        self.memory.base_address()
    }
}

impl QueryRegions for CancelOnRead {
    fn query_region(&self, address: u64) -> Option<MemoryRegion> {
        self.memory.query_region(address)
    }
}

#[derive(Default)]
pub struct MockMemoryBuilder {
    base: Option<u64>,
    regions: Vec<MockRegion>,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(mut self, base: u64) -> Self {
        self.base = Some(base);
        self
    }

    pub fn region(mut self, base: u64, size: usize, protection: u32) -> Self {
        self.regions.push(MockRegion {
            base,
            protection,
            data: RefCell::new(vec![0; size]),
        });
        self
    }

    pub fn writable(self, base: u64, size: usize) -> Self {
        self.region(base, size, protect::READWRITE)
    }

    pub fn readonly(self, base: u64, size: usize) -> Self {
        self.region(base, size, protect::READONLY)
    }

    /// Place bytes inside an existing region, regardless of its protection.
    pub fn bytes_at(self, address: u64, bytes: &[u8]) -> Self {
        let region = self
            .regions
            .iter()
            .find(|r| address >= r.base && address + bytes.len() as u64 <= r.end())
            .unwrap_or_else(|| panic!("no mock region covers {address:#x}"));
        let start = (address - region.base) as usize;
        region.data.borrow_mut()[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn i32_at(self, address: u64, value: i32) -> Self {
        self.bytes_at(address, &value.to_le_bytes())
    }

    pub fn f32_at(self, address: u64, value: f32) -> Self {
        self.bytes_at(address, &value.to_le_bytes())
    }

    pub fn pointer_at(self, address: u64, target: u64) -> Self {
        self.bytes_at(address, &(target as u32).to_le_bytes())
    }

    pub fn build(mut self) -> MockMemory {
        self.regions.sort_by_key(|r| r.base);
        MockMemory {
            base: self.base.unwrap_or(MOCK_MODULE_BASE),
            regions: self.regions,
            reads: Cell::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Regions;

    #[test]
    fn test_builder_places_values() {
        let memory = MockMemoryBuilder::new()
            .readonly(0x1000, 0x20)
            .i32_at(0x1004, -7)
            .pointer_at(0x1008, 0x1234_5678)
            .build();

        assert_eq!(memory.base_address(), MOCK_MODULE_BASE);
        assert_eq!(memory.read_i32(0x1004).unwrap(), -7);
        assert_eq!(memory.read_pointer(0x1008).unwrap(), 0x1234_5678);
        assert_eq!(memory.read_count(), 2);
        assert!(memory.write_i32(0x1004, 1).is_err());
    }

    #[test]
    fn test_regions_are_sorted() {
        let memory = MockMemoryBuilder::new()
            .writable(0x9000, 0x10)
            .readonly(0x1000, 0x10)
            .build();
        let bases: Vec<u64> = Regions::new(&memory).map(|r| r.base).collect();
        assert_eq!(bases, vec![0x1000, 0x9000]);
    }
}
