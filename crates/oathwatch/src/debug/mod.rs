//! Debug utilities for checking chains against a live client
//!
//! This module provides tools for:
//! - Checking every configured chain and the stats record (`DiagnosticReport`)
//! - Dumping raw fields around a record base (`dump_fields`)

mod fields;
mod report;

pub use fields::{FIELD_DUMP_CAP, FieldEntry, FieldKind, FieldRange, FieldValue, dump_fields};
pub use report::{ChainStatus, DiagnosticReport, StatsValidation};
