use std::ops::ControlFlow;

use memchr::memmem;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::info;

use super::{ScanCandidate, ScanReport, scan_regions};
use crate::codec;
use crate::error::{Error, Result};
use crate::memory::{QueryRegions, ReadMemory};
use crate::shutdown::ShutdownSignal;

/// How text is laid out in the target's memory.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    Ascii,
    #[strum(to_string = "utf16", serialize = "utf-16le")]
    Utf16Le,
    /// The game's single-byte Vietnamese charset.
    Viscii,
}

impl TextEncoding {
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        if text.is_empty() {
            return Err(Error::InvalidPattern("search text is empty".to_string()));
        }
        match self {
            TextEncoding::Ascii if !text.is_ascii() => Err(Error::InvalidPattern(format!(
                "'{}' is not ASCII; search with the viscii or utf16 encoding",
                text
            ))),
            TextEncoding::Ascii => Ok(text.as_bytes().to_vec()),
            TextEncoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            TextEncoding::Viscii => Ok(codec::encode(text)),
        }
    }
}

/// Find every occurrence of `text` across readable regions.
pub fn find_text<R: ReadMemory + QueryRegions + ?Sized>(
    reader: &R,
    text: &str,
    encoding: TextEncoding,
    cap: usize,
    signal: &ShutdownSignal,
) -> Result<ScanReport<ScanCandidate>> {
    let needle = encoding.encode(text)?;
    let finder = memmem::Finder::new(&needle);
    let mut report = ScanReport::new();

    scan_regions(
        reader,
        |_| true,
        needle.len() - 1,
        signal,
        &mut report,
        |chunk, report| {
            for offset in finder.find_iter(chunk.bytes) {
                if offset >= chunk.accept_len {
                    break;
                }
                let candidate = ScanCandidate {
                    address: chunk.base + offset as u64,
                    matched: text.to_string(),
                    score: 1,
                };
                report.push(candidate, cap)?;
            }
            ControlFlow::Continue(())
        },
    );

    info!(
        "Text scan for '{}' ({}): {} match(es) in {} region(s)",
        text,
        encoding,
        report.results.len(),
        report.regions_scanned
    );
    Ok(report)
}

/// [`find_text`] for plain ASCII with the default result cap.
pub fn find_ascii_string<R: ReadMemory + QueryRegions + ?Sized>(
    reader: &R,
    text: &str,
    signal: &ShutdownSignal,
) -> Result<ScanReport<ScanCandidate>> {
    find_text(reader, text, TextEncoding::Ascii, super::DEFAULT_RESULT_CAP, signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;

    #[test]
    fn test_encodings() {
        assert_eq!(TextEncoding::Ascii.encode("Lac").unwrap(), b"Lac");
        assert_eq!(
            TextEncoding::Utf16Le.encode("Ab").unwrap(),
            vec![b'A', 0, b'b', 0]
        );
        assert_eq!(TextEncoding::Viscii.encode("Đ").unwrap(), vec![0xD0]);
        assert!(TextEncoding::Ascii.encode("Đ").is_err());
        assert!(TextEncoding::Ascii.encode("").is_err());
        assert_eq!("UTF16".parse::<TextEncoding>().unwrap(), TextEncoding::Utf16Le);
    }

    #[test]
    fn test_finds_all_matches_in_readable_regions() {
        let memory = MockMemoryBuilder::new()
            .readonly(0x1000, 64)
            .bytes_at(0x1004, b"Lac Duong")
            .bytes_at(0x1020, b"Lac Duong")
            .region(0x3000, 64, crate::memory::protect::NOACCESS)
            .writable(0x5000, 64)
            .bytes_at(0x5010, b"Lac Duong")
            .build();

        let report = find_ascii_string(&memory, "Lac Duong", &ShutdownSignal::new()).unwrap();
        let addresses: Vec<u64> = report.results.iter().map(|c| c.address).collect();
        assert_eq!(addresses, vec![0x1004, 0x1020, 0x5010]);
        assert_eq!(report.regions_scanned, 2);
    }

    #[test]
    fn test_result_cap_truncates() {
        let memory = MockMemoryBuilder::new()
            .readonly(0x1000, 64)
            .bytes_at(0x1000, &[b'a'; 64])
            .build();

        let report = find_text(&memory, "aa", TextEncoding::Ascii, 5, &ShutdownSignal::new())
            .unwrap();
        assert_eq!(report.results.len(), 5);
        assert!(report.truncated);
    }

    #[test]
    fn test_empty_address_space() {
        let memory = MockMemoryBuilder::new().build();
        let report = find_ascii_string(&memory, "x", &ShutdownSignal::new()).unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.regions_scanned, 0);
    }
}
