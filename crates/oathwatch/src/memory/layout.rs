//! Memory layout constants for the game's data records
//!
//! Field offsets are relative to the base a pointer chain resolves to.
//! Constants are organized by record kind.

/// Character attributes, relative to the stats base
pub mod stats {
    /// Fixed-length name buffer
    pub const NAME: u64 = 48;
    pub const NAME_LEN: usize = 30;

    pub const LEVEL: u64 = 92;
    pub const HP: u64 = 1752;
    pub const MP: u64 = 1756;
    /// Current MP offset + 100
    pub const MAX_HP: u64 = 1856;
    pub const MAX_MP: u64 = 1860;
    pub const PET_ID: u64 = 2356;
    pub const EXPERIENCE: u64 = 2408;
}

/// World position, relative to the entity base
pub mod entity {
    pub const X: u64 = 92;
    pub const Y: u64 = 100;
}

pub mod map {
    pub const MAP_ID: u64 = 96;
}

/// Pet roster table, relative to the pet table base
pub mod pet {
    pub const RECORD_SIZE: u64 = 92;
    pub const MAX_RECORDS: usize = 20;

    pub const ID_CHECK: u64 = 36;
    pub const HP: u64 = 40;
    pub const MAX_HP: u64 = 44;
}

/// Plausibility limits for a stats record
pub mod limits {
    pub const MAX_NAME_CHARS: usize = 20;
    pub const MIN_LEVEL: i32 = 1;
    pub const MAX_LEVEL: i32 = 150;
    pub const MAX_POOL: i32 = 1_000_000;

    /// Lowest address a 32-bit user-mode pointer plausibly holds
    pub const MIN_USER_ADDRESS: u64 = 0x0040_0000;
    pub const MAX_USER_ADDRESS: u64 = 0x7FFF_FFFF;

    /// Addresses below this are treated as module-static
    pub const STATIC_ADDRESS_CEILING: u64 = 10_000_000;
}

/// Timing constants for polling and automation
pub mod timing {
    pub const POLL_INTERVAL_MS: u64 = 1000;
    pub const DISCOVERY_INTERVAL_MS: u64 = 5000;

    /// Time a key is held between key-down and key-up (ms)
    pub const KEY_HOLD_MS: u64 = 50;

    /// Grace period an automation loop gets to finish after stop (ms)
    pub const AUTOMATION_STOP_GRACE_MS: u64 = 2000;
}
