mod handle;
pub mod layout;
mod process;
mod reader;
mod region;

#[cfg(test)]
pub mod mock;

pub use handle::{OwnedHandle, ReleaseHandle};
pub use process::{ModuleInfo, ProcessHandle, find_processes, list_modules, resolve_module_base};
pub use reader::{MemoryAccessor, ReadMemory, WriteMemory};
pub use region::{MemoryRegion, QueryRegions, Regions, protect};

#[cfg(test)]
pub use mock::{CancelOnRead, MOCK_MODULE_BASE, MockMemory, MockMemoryBuilder};
