//! # oathwatch
//!
//! Core library for watching and scripting Dragon Oath game clients.
//!
//! This crate provides:
//! - Windows process attach, typed memory reads and writes
//! - Pointer chain resolution from the game module base
//! - Decoding of the client's legacy Vietnamese string encoding
//! - Plausibility checks and brute-force rescans for when a client update moves chains
//! - Whole-process scans for byte patterns, strings, pointers and values
//! - Character snapshots, per-client polling and skill key automation
//!
//! ## Feature Flags
//!
//! - `debug-tools`: Enables the diagnostic report and field dumps.
//!   This feature is intended for CLI tools and development, not production use.

pub mod automation;
pub mod codec;
pub mod config;
#[cfg(feature = "debug-tools")]
pub mod debug;
pub mod error;
pub mod game;
pub mod memory;
pub mod monitor;
pub mod offset;
pub mod prelude;
pub mod scan;
pub mod shutdown;

pub use automation::{AutomationLoop, KeyInput, SkillKey, WindowKeyInput, run_combo};
pub use config::{Config, ScanConfig};
pub use error::{Error, Result};
pub use game::{
    CharacterSnapshot, CharacterStats, HealthStatus, LoginState, MapInfo, PetRecord, Position,
    SceneTable, SnapshotReader, StatsWriter,
};
pub use memory::{
    MemoryAccessor, MemoryRegion, ProcessHandle, QueryRegions, ReadMemory, WriteMemory,
    find_processes, list_modules, resolve_module_base,
};
pub use monitor::{Monitor, MonitorTarget, PollEvent, ProcessSource, SnapshotSource};
pub use offset::searcher::{
    BaseScan, ChainProbe, MapChainCandidate, ScanRange, scan_for_candidate_bases,
    scan_for_map_chains, test_chain, validate_stats_record,
};
pub use offset::{ChainKind, PointerChain, PointerChains, Signature};
pub use scan::{ScanCandidate, ScanReport, TextEncoding};
pub use shutdown::ShutdownSignal;

// Debug utilities (requires debug-tools feature)
#[cfg(feature = "debug-tools")]
pub use debug::{ChainStatus, DiagnosticReport, FieldEntry, FieldKind, StatsValidation, dump_fields};
