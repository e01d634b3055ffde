use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Access denied opening process {pid} (try running as Administrator)")]
    AccessDenied { pid: u32 },

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Module {module} is not loaded in process {pid}")]
    ModuleNotFound { pid: u32, module: String },

    #[error("Refusing to access null address")]
    NullAddress,

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Pointer chain broken at step {step} (address {address:#x})")]
    ChainBroken { step: usize, address: u64 },

    #[error("Invalid pointer chain: {0}")]
    InvalidChain(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Skill slot {0} is outside 0..=11")]
    InvalidSkillSlot(u8),

    #[error("Key input failed: {0}")]
    InputFailed(String),

    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Attach failures end a polling session; everything else is absorbed per poll.
    pub fn is_attach_failure(&self) -> bool {
        matches!(
            self,
            Error::ProcessNotFound(_)
                | Error::AccessDenied { .. }
                | Error::ProcessOpenFailed(_)
                | Error::ModuleNotFound { .. }
        )
    }
}
