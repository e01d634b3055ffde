//! Search-related constants for chain recovery
//!
//! # Search Strategy
//!
//! Chain heads are module-relative static addresses. When a game update moves
//! them, the tail of each chain (the offsets inside heap objects) usually
//! survives. Recovery therefore keeps the tail and brute-forces the head,
//! accepting a head only when the record it leads to passes validation.
//!
//! ```text
//!   module base + head ──► object ──+12──► object ──+340──► ... ──► record
//!        ▲ scanned                     kept unchanged
//! ```

/// Module-relative starts of the default brute-force ranges.
///
/// The static data of the game usually sits between these and the next
/// million; the working stats head (2381824) is far below, so a hit here means
/// the layout moved.
pub const DEFAULT_BASE_SCAN_STARTS: [u64; 3] = [6_000_000, 7_000_000, 8_000_000];

/// Length of each default range in bytes.
pub const DEFAULT_BASE_SCAN_LEN: u64 = 100_000;

/// Candidate heads step at pointer alignment.
pub const POINTER_ALIGN: u64 = 4;

// ============================================================================
// Map chain discovery
// ============================================================================

/// Pattern 1: `[head, o]`
pub const MAP_DIRECT_OFFSETS: [i64; 7] = [8, 12, 16, 20, 24, 28, 32];

/// Pattern 2: `[head, 12, o]`
pub const MAP_NESTED_OFFSETS: [i64; 9] = [4, 8, 12, 16, 20, 100, 200, 300, 340];

/// First tail offset of pattern 2 and the only one of pattern 3.
pub const MAP_ENTITY_OFFSET: i64 = 12;

/// Pattern 3: `[head ± radius, 12]`
pub const MAP_NEIGHBOUR_RADIUS: i64 = 50_000;

/// Offsets inside a candidate map object probed for a map id.
pub const MAP_ID_PROBE_OFFSETS: [u64; 13] = [0, 4, 8, 12, 16, 20, 24, 28, 32, 64, 96, 100, 128];

pub const MIN_MAP_ID: i32 = 1;
pub const MAX_MAP_ID: i32 = 100;
