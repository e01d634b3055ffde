//! Prelude module for convenient imports
//!
//! ```ignore
//! use oathwatch::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Attach and memory access: `ProcessHandle`, `MemoryAccessor`, `ReadMemory`, `WriteMemory`
//! - Chains: `PointerChain`, `PointerChains`, `ChainKind`
//! - Snapshots: `SnapshotReader`, `CharacterSnapshot`, `SceneTable`
//! - Error handling: `Error`, `Result`

pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::game::{CharacterSnapshot, SceneTable, SnapshotReader, StatsWriter};
pub use crate::memory::{MemoryAccessor, ProcessHandle, ReadMemory, WriteMemory};
pub use crate::offset::{ChainKind, PointerChain, PointerChains};
pub use crate::shutdown::ShutdownSignal;
