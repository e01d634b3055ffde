//! Target process attachment.
//!
//! A [`ProcessHandle`] owns one OS process handle opened with combined
//! read/write/query rights, plus the load address of the module every pointer
//! chain is relative to. Raw memory access lives here; typed access goes
//! through [`MemoryAccessor`](super::MemoryAccessor).

use tracing::{debug, info, warn};

use super::handle::{OwnedHandle, ReleaseHandle};
use super::region::MemoryRegion;
use crate::error::{Error, Result};

/// A loaded module inside the target process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub base: u64,
    pub size: u32,
}

#[derive(Debug)]
pub struct ProcessHandle {
    pub pid: u32,
    /// Load address of `module_name`; chain offsets are relative to it.
    pub base_address: u64,
    pub module_name: String,
    handle: OwnedHandle<RawProcess>,
}

impl ProcessHandle {
    /// Open `pid` and resolve the base of `module_name` in one step.
    pub fn attach(pid: u32, module_name: &str) -> Result<Self> {
        let raw = RawProcess::open(pid)?;
        let mut process = Self {
            pid,
            base_address: 0,
            module_name: module_name.to_string(),
            handle: OwnedHandle::new(raw),
        };

        match resolve_module_base(pid, module_name) {
            Some(base) => process.base_address = base,
            None => {
                warn!("Module {} not loaded in process {}", module_name, pid);
                process.close();
                return Err(Error::ModuleNotFound {
                    pid,
                    module: module_name.to_string(),
                });
            }
        }

        info!(
            "Attached to process {} ({} at {:#x})",
            pid, module_name, process.base_address
        );
        Ok(process)
    }

    /// Attach to the first running process named `process_name`.
    pub fn find_and_attach(process_name: &str, module_name: &str) -> Result<Self> {
        let pid = find_processes(process_name)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ProcessNotFound(process_name.to_string()))?;
        Self::attach(pid, module_name)
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Release the OS handle. Idempotent; later reads fail cleanly.
    pub fn close(&mut self) {
        if self.handle.is_valid() {
            debug!("Closing handle for process {}", self.pid);
        }
        self.handle.close();
    }

    /// Re-resolve the module base. Fails with `ModuleNotFound` once the process is gone.
    pub fn refresh_base(&mut self) -> Result<u64> {
        if !self.is_valid() {
            return Err(Error::ProcessNotFound(format!("process {} is closed", self.pid)));
        }
        let base = resolve_module_base(self.pid, &self.module_name).ok_or_else(|| {
            Error::ModuleNotFound {
                pid: self.pid,
                module: self.module_name.clone(),
            }
        })?;
        if base != self.base_address {
            debug!(
                "Module base for process {} moved {:#x} -> {:#x}",
                self.pid, self.base_address, base
            );
            self.base_address = base;
        }
        Ok(base)
    }

    fn raw(&self) -> Result<&RawProcess> {
        self.handle
            .get()
            .ok_or_else(|| Error::ProcessOpenFailed(format!("process {} is not attached", self.pid)))
    }

    pub(crate) fn read_raw(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.raw()?.read(address, size)
    }

    pub(crate) fn write_raw(&self, address: u64, data: &[u8]) -> Result<()> {
        self.raw()?.write(address, data)
    }

    pub(crate) fn query_raw(&self, address: u64) -> Option<MemoryRegion> {
        self.raw().ok()?.query(address)
    }
}

fn matches_process_name(exe: &str, wanted: &str) -> bool {
    let strip = |s: &str| {
        let lower = s.to_ascii_lowercase();
        lower.strip_suffix(".exe").map(str::to_string).unwrap_or(lower)
    };
    strip(exe) == strip(wanted)
}

// --- Windows implementation ---

#[cfg(target_os = "windows")]
#[derive(Debug)]
pub struct RawProcess(windows::Win32::Foundation::HANDLE);

// SAFETY: process handles are kernel object references usable from any thread.
#[cfg(target_os = "windows")]
unsafe impl Send for RawProcess {}

#[cfg(target_os = "windows")]
impl ReleaseHandle for RawProcess {
    fn release(self) {
        use windows::Win32::Foundation::CloseHandle;
        // SAFETY: the handle came from OpenProcess and is released only here.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

#[cfg(target_os = "windows")]
impl RawProcess {
    fn open(pid: u32) -> Result<Self> {
        use windows::Win32::Foundation::{ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER};
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ,
            PROCESS_VM_WRITE,
        };

        let access =
            PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION | PROCESS_QUERY_INFORMATION;

        // SAFETY: OpenProcess has no memory-safety preconditions.
        match unsafe { OpenProcess(access, false, pid) } {
            Ok(handle) if !handle.is_invalid() => Ok(Self(handle)),
            Ok(_) => Err(Error::ProcessOpenFailed(format!(
                "OpenProcess returned an invalid handle for {}",
                pid
            ))),
            Err(e) if e.code() == ERROR_ACCESS_DENIED.to_hresult() => {
                Err(Error::AccessDenied { pid })
            }
            Err(e) if e.code() == ERROR_INVALID_PARAMETER.to_hresult() => {
                Err(Error::ProcessNotFound(format!("pid {}", pid)))
            }
            Err(e) => Err(Error::ProcessOpenFailed(e.to_string())),
        }
    }

    fn read(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0usize;
        // SAFETY: the buffer is sized for `size` bytes; the remote address is
        // validated by the kernel.
        unsafe {
            ReadProcessMemory(
                self.0,
                address as *const _,
                buffer.as_mut_ptr().cast(),
                size,
                Some(&mut bytes_read),
            )
        }
        .map_err(|e| Error::MemoryReadFailed {
            address,
            message: e.to_string(),
        })?;

        if bytes_read != size {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("short read: {} of {} bytes", bytes_read, size),
            });
        }
        Ok(buffer)
    }

    fn write(&self, address: u64, data: &[u8]) -> Result<()> {
        use windows::Win32::System::Diagnostics::Debug::WriteProcessMemory;

        let mut written = 0usize;
        // SAFETY: `data` outlives the call and its length is passed explicitly.
        unsafe {
            WriteProcessMemory(
                self.0,
                address as *const _,
                data.as_ptr().cast(),
                data.len(),
                Some(&mut written),
            )
        }
        .map_err(|e| Error::MemoryWriteFailed {
            address,
            message: e.to_string(),
        })?;

        if written != data.len() {
            return Err(Error::MemoryWriteFailed {
                address,
                message: format!("short write: {} of {} bytes", written, data.len()),
            });
        }
        Ok(())
    }

    fn query(&self, address: u64) -> Option<MemoryRegion> {
        use windows::Win32::System::Memory::{MEM_COMMIT, MEMORY_BASIC_INFORMATION, VirtualQueryEx};

        let mut info = MEMORY_BASIC_INFORMATION::default();
        // SAFETY: `info` is a properly sized out-parameter.
        let written = unsafe {
            VirtualQueryEx(
                self.0,
                Some(address as *const _),
                &mut info,
                std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };
        if written == 0 {
            return None;
        }

        Some(MemoryRegion {
            base: info.BaseAddress as u64,
            size: info.RegionSize as u64,
            protection: info.Protect.0,
            committed: info.State == MEM_COMMIT,
        })
    }
}

/// List every loaded module of `pid`.
#[cfg(target_os = "windows")]
pub fn list_modules(pid: u32) -> Result<Vec<ModuleInfo>> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW, TH32CS_SNAPMODULE,
        TH32CS_SNAPMODULE32,
    };

    // SAFETY: the snapshot handle is closed before returning on every path.
    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid)
            .map_err(|e| Error::ProcessOpenFailed(format!("module snapshot failed: {}", e)))?;

        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        let mut modules = Vec::new();
        if Module32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let name = String::from_utf16_lossy(&entry.szModule)
                    .trim_end_matches('\0')
                    .to_string();
                modules.push(ModuleInfo {
                    name,
                    base: entry.modBaseAddr as u64,
                    size: entry.modBaseSize,
                });
                if Module32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }

        let _ = CloseHandle(snapshot);
        Ok(modules)
    }
}

/// Find the pids of every running process whose executable matches `name`.
#[cfg(target_os = "windows")]
pub fn find_processes(name: &str) -> Result<Vec<u32>> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
        TH32CS_SNAPPROCESS,
    };

    // SAFETY: the snapshot handle is closed before returning on every path.
    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
            .map_err(|e| Error::ProcessOpenFailed(format!("process snapshot failed: {}", e)))?;

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut pids = Vec::new();
        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let exe = String::from_utf16_lossy(&entry.szExeFile)
                    .trim_end_matches('\0')
                    .to_string();
                if matches_process_name(&exe, name) {
                    pids.push(entry.th32ProcessID);
                }
                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }

        let _ = CloseHandle(snapshot);
        Ok(pids)
    }
}

// --- Non-Windows stubs ---

#[cfg(not(target_os = "windows"))]
#[derive(Debug)]
pub struct RawProcess(());

#[cfg(not(target_os = "windows"))]
impl ReleaseHandle for RawProcess {
    fn release(self) {}
}

#[cfg(not(target_os = "windows"))]
impl RawProcess {
    fn open(_pid: u32) -> Result<Self> {
        Err(Error::Unsupported(
            "process attachment is only supported on Windows".to_string(),
        ))
    }

    fn read(&self, address: u64, _size: usize) -> Result<Vec<u8>> {
        Err(Error::MemoryReadFailed {
            address,
            message: "unsupported platform".to_string(),
        })
    }

    fn write(&self, address: u64, _data: &[u8]) -> Result<()> {
        Err(Error::MemoryWriteFailed {
            address,
            message: "unsupported platform".to_string(),
        })
    }

    fn query(&self, _address: u64) -> Option<MemoryRegion> {
        None
    }
}

#[cfg(not(target_os = "windows"))]
pub fn list_modules(_pid: u32) -> Result<Vec<ModuleInfo>> {
    Err(Error::Unsupported(
        "module enumeration is only supported on Windows".to_string(),
    ))
}

#[cfg(not(target_os = "windows"))]
pub fn find_processes(_name: &str) -> Result<Vec<u32>> {
    Err(Error::Unsupported(
        "process enumeration is only supported on Windows".to_string(),
    ))
}

/// Base load address of `module_name` in `pid`, or `None` if it is not loaded.
pub fn resolve_module_base(pid: u32, module_name: &str) -> Option<u64> {
    match list_modules(pid) {
        Ok(modules) => {
            let found = modules
                .iter()
                .find(|m| m.name.eq_ignore_ascii_case(module_name))
                .map(|m| m.base);
            match found {
                Some(base) => debug!("Found {} at {:#x}", module_name, base),
                None => debug!("Module {} not found in process {}", module_name, pid),
            }
            found
        }
        Err(e) => {
            debug!("Module enumeration failed for process {}: {}", pid, e);
            None
        }
    }
}
