//! Virtual memory regions of a target process.

/// Page protection bits (values match the Win32 `PAGE_*` constants).
pub mod protect {
    pub const NOACCESS: u32 = 0x01;
    pub const READONLY: u32 = 0x02;
    pub const READWRITE: u32 = 0x04;
    pub const WRITECOPY: u32 = 0x08;
    pub const EXECUTE: u32 = 0x10;
    pub const EXECUTE_READ: u32 = 0x20;
    pub const EXECUTE_READWRITE: u32 = 0x40;
    pub const EXECUTE_WRITECOPY: u32 = 0x80;
    pub const GUARD: u32 = 0x100;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base: u64,
    pub size: u64,
    pub protection: u32,
    pub committed: bool,
}

impl MemoryRegion {
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }

    pub fn is_readable(&self) -> bool {
        use protect::*;
        self.committed
            && self.protection & (NOACCESS | GUARD) == 0
            && self.protection
                & (READONLY
                    | READWRITE
                    | WRITECOPY
                    | EXECUTE_READ
                    | EXECUTE_READWRITE
                    | EXECUTE_WRITECOPY)
                != 0
    }

    pub fn is_writable(&self) -> bool {
        use protect::*;
        self.committed
            && self.protection & GUARD == 0
            && self.protection & (READWRITE | EXECUTE_READWRITE) != 0
    }
}

/// Region enumeration, one query at a time.
pub trait QueryRegions {
    /// Describe the region containing (or the first region at or after) `address`.
    ///
    /// Returns `None` past the end of the address space.
    fn query_region(&self, address: u64) -> Option<MemoryRegion>;
}

/// Iterator over every region of a process, committed or not.
///
/// Each step starts the next query at `region.base + region.size`; a region
/// that would not advance the cursor ends the walk.
pub struct Regions<'a, Q: QueryRegions + ?Sized> {
    source: &'a Q,
    cursor: Option<u64>,
}

impl<'a, Q: QueryRegions + ?Sized> Regions<'a, Q> {
    pub fn new(source: &'a Q) -> Self {
        Self {
            source,
            cursor: Some(0),
        }
    }
}

impl<Q: QueryRegions + ?Sized> Iterator for Regions<'_, Q> {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor?;
        let region = self.source.query_region(cursor)?;
        let next = region.base.checked_add(region.size);
        self.cursor = match next {
            Some(next) if next > cursor => Some(next),
            _ => None,
        };
        Some(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRegions(Vec<MemoryRegion>);

    impl QueryRegions for FixedRegions {
        fn query_region(&self, address: u64) -> Option<MemoryRegion> {
            self.0.iter().find(|r| r.end() > address).copied()
        }
    }

    fn region(base: u64, size: u64, protection: u32) -> MemoryRegion {
        MemoryRegion {
            base,
            size,
            protection,
            committed: true,
        }
    }

    #[test]
    fn test_regions_walk_forward() {
        let source = FixedRegions(vec![
            region(0x1000, 0x1000, protect::READONLY),
            region(0x4000, 0x2000, protect::READWRITE),
        ]);
        let bases: Vec<u64> = Regions::new(&source).map(|r| r.base).collect();
        assert_eq!(bases, vec![0x1000, 0x4000]);
    }

    #[test]
    fn test_regions_empty_terminates() {
        let source = FixedRegions(Vec::new());
        assert_eq!(Regions::new(&source).count(), 0);
    }

    #[test]
    fn test_zero_sized_region_does_not_loop() {
        struct Stuck;
        impl QueryRegions for Stuck {
            fn query_region(&self, _address: u64) -> Option<MemoryRegion> {
                Some(MemoryRegion {
                    base: 0,
                    size: 0,
                    protection: protect::READONLY,
                    committed: true,
                })
            }
        }
        assert_eq!(Regions::new(&Stuck).count(), 1);
    }

    #[test]
    fn test_protection_flags() {
        assert!(region(0, 1, protect::READWRITE).is_writable());
        assert!(region(0, 1, protect::READONLY).is_readable());
        assert!(!region(0, 1, protect::READONLY).is_writable());
        assert!(!region(0, 1, protect::NOACCESS).is_readable());
        assert!(!region(0, 1, protect::READWRITE | protect::GUARD).is_readable());

        let reserved = MemoryRegion {
            committed: false,
            ..region(0, 1, protect::READWRITE)
        };
        assert!(!reserved.is_readable());
    }
}
