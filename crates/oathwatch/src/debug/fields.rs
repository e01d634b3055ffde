//! Field dump: list non-empty values at a range of offsets from a record base.

use std::fmt;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::memory::ReadMemory;
use crate::memory::layout::stats::NAME_LEN;
use crate::scan::ScanReport;
use crate::shutdown::ShutdownSignal;

/// Result cap for one dump.
pub const FIELD_DUMP_CAP: usize = 1000;

const FLOAT_EPSILON: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FieldKind {
    Int,
    Float,
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i32),
    Float(f32),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{:.2}", v),
            FieldValue::Text(v) => write!(f, "{:?}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldEntry {
    pub offset: u64,
    pub address: u64,
    pub value: FieldValue,
}

impl fmt::Display for FieldEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "+{:<5} (0x{:08X}) -> {}",
            self.offset, self.address, self.value
        )
    }
}

/// Which offsets to visit: `from..=to` at `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRange {
    pub from: u64,
    pub to: u64,
    pub step: u64,
}

fn read_field<R: ReadMemory + ?Sized>(reader: &R, address: u64, kind: FieldKind) -> Option<FieldValue> {
    match kind {
        FieldKind::Int => reader
            .read_i32(address)
            .ok()
            .filter(|&v| v != 0)
            .map(FieldValue::Int),
        FieldKind::Float => reader
            .read_f32(address)
            .ok()
            .filter(|v| v.abs() > FLOAT_EPSILON)
            .map(FieldValue::Float),
        FieldKind::String => {
            let text = reader.read_fixed_string(address, NAME_LEN);
            (!text.is_empty()).then_some(FieldValue::Text(text))
        }
    }
}

/// Dump every non-zero value of `kind` between `range.from` and `range.to`
/// (inclusive) from `base`. Unreadable offsets are skipped.
pub fn dump_fields<R: ReadMemory + ?Sized>(
    reader: &R,
    base: u64,
    range: FieldRange,
    kind: FieldKind,
    signal: &ShutdownSignal,
) -> ScanReport<FieldEntry> {
    let mut report = ScanReport::new();
    let step = range.step.max(1);
    let mut offset = range.from;

    while offset <= range.to {
        if signal.is_shutdown() {
            report.cancelled = true;
            break;
        }
        let address = base.wrapping_add(offset);
        if let Some(value) = read_field(reader, address, kind) {
            let entry = FieldEntry {
                offset,
                address,
                value,
            };
            if report.push(entry, FIELD_DUMP_CAP).is_break() {
                break;
            }
        }
        offset += step;
    }
    report.regions_scanned = 1;
    report
}
