use tracing::debug;

use super::process::ProcessHandle;
use super::region::{MemoryRegion, QueryRegions};
use crate::codec;
use crate::error::{Error, Result};

/// Typed reads from a target address space.
///
/// Every provided method refuses address 0 with [`Error::NullAddress`]
/// before touching the target.
pub trait ReadMemory {
    /// Read exactly `size` bytes, or fail.
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Load address of the module chains are relative to.
    fn base_address(&self) -> u64;

    fn read_word(&self, address: u64) -> Result<[u8; 4]> {
        if address == 0 {
            return Err(Error::NullAddress);
        }
        let bytes = self.read_bytes(address, 4)?;
        <[u8; 4]>::try_from(bytes.as_slice()).map_err(|_| Error::MemoryReadFailed {
            address,
            message: format!("short read: {} of 4 bytes", bytes.len()),
        })
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        self.read_word(address).map(i32::from_le_bytes)
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        self.read_word(address).map(u32::from_le_bytes)
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        self.read_word(address).map(f32::from_le_bytes)
    }

    /// Read a 32-bit pointer, widened to an address.
    fn read_pointer(&self, address: u64) -> Result<u64> {
        self.read_u32(address).map(u64::from)
    }

    /// Read `size` bytes; a failed or null read yields a zero-filled buffer.
    fn read_bytes_or_zeroed(&self, address: u64, size: usize) -> Vec<u8> {
        if address == 0 {
            return vec![0; size];
        }
        match self.read_bytes(address, size) {
            Ok(bytes) if bytes.len() == size => bytes,
            Ok(_) | Err(_) => {
                debug!("Zero-filling {} bytes at {:#x}", size, address);
                vec![0; size]
            }
        }
    }

    /// Read and decode a fixed-length game string. Never fails.
    fn read_fixed_string(&self, address: u64, max_len: usize) -> String {
        codec::decode_fixed(&self.read_bytes_or_zeroed(address, max_len))
    }
}

/// Typed writes into a target address space.
pub trait WriteMemory {
    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()>;

    fn write_i32(&self, address: u64, value: i32) -> Result<()> {
        if address == 0 {
            return Err(Error::NullAddress);
        }
        self.write_bytes(address, &value.to_le_bytes())
    }

    fn write_f32(&self, address: u64, value: f32) -> Result<()> {
        if address == 0 {
            return Err(Error::NullAddress);
        }
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Encode `text` and write it into a `max_len` byte buffer, zero-padded.
    ///
    /// The last byte is always a terminator, so at most `max_len - 1`
    /// characters are kept.
    fn write_fixed_string(&self, address: u64, text: &str, max_len: usize) -> Result<()> {
        if address == 0 {
            return Err(Error::NullAddress);
        }
        let mut buffer = codec::encode(text);
        buffer.truncate(max_len.saturating_sub(1));
        buffer.resize(max_len, 0);
        self.write_bytes(address, &buffer)
    }
}

/// Read and write access to an attached process.
///
/// Borrows the [`ProcessHandle`] so the handle and module base stay fixed
/// for the lifetime of one poll or scan.
pub struct MemoryAccessor<'a> {
    process: &'a ProcessHandle,
}

impl<'a> MemoryAccessor<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self { process }
    }

    pub fn process(&self) -> &ProcessHandle {
        self.process
    }
}

impl ReadMemory for MemoryAccessor<'_> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if address == 0 {
            return Err(Error::NullAddress);
        }
        self.process.read_raw(address, size)
    }

    fn base_address(&self) -> u64 {
        self.process.base_address
    }
}

impl WriteMemory for MemoryAccessor<'_> {
    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        if address == 0 {
            return Err(Error::NullAddress);
        }
        self.process.write_raw(address, data)
    }
}

impl QueryRegions for MemoryAccessor<'_> {
    fn query_region(&self, address: u64) -> Option<MemoryRegion> {
        self.process.query_raw(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mock::MockMemoryBuilder;

    #[test]
    fn test_round_trip_i32_boundaries() {
        let memory = MockMemoryBuilder::new().writable(0x1000, 0x100).build();
        for value in [0, -1, i32::MIN, i32::MAX, 1] {
            memory.write_i32(0x1010, value).unwrap();
            assert_eq!(memory.read_i32(0x1010).unwrap(), value);
        }
    }

    #[test]
    fn test_round_trip_f32_boundaries() {
        let memory = MockMemoryBuilder::new().writable(0x1000, 0x100).build();
        for value in [0.0f32, -1.5, f32::INFINITY, f32::NEG_INFINITY, f32::MIN_POSITIVE] {
            memory.write_f32(0x1020, value).unwrap();
            assert_eq!(memory.read_f32(0x1020).unwrap(), value);
        }

        memory.write_f32(0x1020, f32::NAN).unwrap();
        assert!(memory.read_f32(0x1020).unwrap().is_nan());
    }

    #[test]
    fn test_null_address_is_refused_without_read() {
        let memory = MockMemoryBuilder::new().writable(0x1000, 0x10).build();
        assert!(matches!(memory.read_i32(0), Err(Error::NullAddress)));
        assert!(matches!(memory.read_f32(0), Err(Error::NullAddress)));
        assert!(matches!(memory.write_i32(0, 5), Err(Error::NullAddress)));
        assert_eq!(memory.read_count(), 0);
    }

    #[test]
    fn test_unmapped_read_is_zero_filled() {
        let memory = MockMemoryBuilder::new().build();
        assert!(memory.read_i32(0x5000).is_err());
        assert_eq!(memory.read_bytes_or_zeroed(0x5000, 8), vec![0; 8]);
        assert_eq!(memory.read_bytes_or_zeroed(0, 3), vec![0; 3]);
        assert_eq!(memory.read_fixed_string(0x5000, 30), "");
    }

    #[test]
    fn test_fixed_string_round_trip() {
        let memory = MockMemoryBuilder::new().writable(0x2000, 0x40).build();
        memory.write_fixed_string(0x2000, "  Đăng nhập", 30).unwrap();
        assert_eq!(memory.read_fixed_string(0x2000, 30), "Đăng nhập");

        memory.write_fixed_string(0x2000, &"x".repeat(40), 30).unwrap();
        assert_eq!(memory.read_fixed_string(0x2000, 30).len(), 29);
    }
}
