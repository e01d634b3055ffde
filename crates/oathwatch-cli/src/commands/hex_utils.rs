//! Address and number parsing for command arguments.

use anyhow::{Context, Result, bail};

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(s, 16).map_err(|e| anyhow::anyhow!("Invalid hex address: {}", e))
}

/// Parse a hex address that must fit in a 32-bit pointer.
pub fn parse_pointer(s: &str) -> Result<u32> {
    let address = parse_hex_address(s)?;
    u32::try_from(address)
        .with_context(|| format!("0x{:X} does not fit in a 32-bit pointer", address))
}

/// Parse a decimal number, or hex with a 0x prefix.
pub fn parse_number(s: &str) -> Result<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).with_context(|| format!("Invalid number: {}", s)),
        None => s.parse().with_context(|| format!("Invalid number: {}", s)),
    }
}

/// Split `A:B` into a start and a length.
pub fn parse_span(s: &str, start: fn(&str) -> Result<u64>) -> Result<(u64, u64)> {
    let Some((a, b)) = s.split_once(':') else {
        bail!("Expected START:LEN, got {}", s);
    };
    Ok((start(a)?, parse_number(b)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_address() {
        assert_eq!(parse_hex_address("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_hex_address("0X1000").unwrap(), 0x1000);
        assert_eq!(parse_hex_address("DEADBEEF").unwrap(), 0xDEADBEEF);
        assert!(parse_hex_address("0xZZZ").is_err());
    }

    #[test]
    fn test_parse_pointer() {
        assert_eq!(parse_pointer("0xFFFFFFFF").unwrap(), u32::MAX);
        assert_eq!(parse_pointer("500000").unwrap(), 0x0050_0000);
        assert!(parse_pointer("0x100000000").is_err());
        assert!(parse_pointer("100000000").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("2381824").unwrap(), 2381824);
        assert_eq!(parse_number("0x245800").unwrap(), 0x245800);
        assert!(parse_number("12ab").is_err());
    }

    #[test]
    fn test_parse_span() {
        assert_eq!(
            parse_span("6000000:100000", parse_number).unwrap(),
            (6_000_000, 100_000)
        );
        assert_eq!(
            parse_span("400000:0x1000", parse_hex_address).unwrap(),
            (0x400000, 0x1000)
        );
        assert!(parse_span("6000000", parse_number).is_err());
    }
}
