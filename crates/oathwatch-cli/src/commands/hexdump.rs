//! Hexdump command implementation.
//!
//! ```text
//! 0x0500002C: 00 00 00 00 48 65 72 6F  00 00 00 00 00 00 00 00  |....Hero........|
//! ```

use anyhow::Result;
use oathwatch::{Config, MemoryAccessor, ReadMemory};

use super::attach;
use super::hex_utils::parse_hex_address;

pub fn run(config: &Config, pid: Option<u32>, address: &str, size: usize, ascii: bool) -> Result<()> {
    let address = parse_hex_address(address)?;
    let process = attach(config, pid)?;
    let reader = MemoryAccessor::new(&process);
    let bytes = reader.read_bytes(address, size)?;

    println!("Hexdump at 0x{:X} ({} bytes):", address, size);
    println!();
    for line in format_lines(address, &bytes, ascii) {
        println!("{}", line);
    }
    Ok(())
}

fn format_lines(base: u64, bytes: &[u8], ascii: bool) -> Vec<String> {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let mut line = format!("0x{:08X}: ", base + (i * 16) as u64);
            for j in 0..16 {
                if j == 8 {
                    line.push(' ');
                }
                match chunk.get(j) {
                    Some(byte) => line.push_str(&format!("{:02X} ", byte)),
                    None => line.push_str("   "),
                }
            }
            if ascii {
                line.push_str(" |");
                line.extend(chunk.iter().map(|&b| {
                    if (0x20..0x7F).contains(&b) {
                        b as char
                    } else {
                        '.'
                    }
                }));
                line.extend(std::iter::repeat_n(' ', 16 - chunk.len()));
                line.push('|');
            }
            line
        })
        .collect()
}
