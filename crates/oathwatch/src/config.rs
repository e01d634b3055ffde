//! Settings file
//!
//! Everything that changes between game builds or machines lives here so a
//! client update can be handled by editing a TOML file rather than rebuilding.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::game::SceneTable;
use crate::memory::layout::timing::{DISCOVERY_INTERVAL_MS, POLL_INTERVAL_MS};
use crate::offset::PointerChains;
use crate::offset::searcher::BaseScan;
use crate::scan::DEFAULT_RESULT_CAP;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "oathwatch.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Cap for text, pointer and pattern scans
    pub result_cap: usize,
    /// Cap for value hunts, which match far more often
    pub value_cap: usize,
    /// Brute-force ranges and the stats chain tail they are walked with
    pub bases: BaseScan,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            result_cap: DEFAULT_RESULT_CAP,
            value_cap: 10_000,
            bases: BaseScan::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Module whose load address chain heads are relative to
    pub module_name: String,
    /// Process name searched for during discovery
    pub process_name: String,
    pub poll_interval_ms: u64,
    pub discovery_interval_ms: u64,
    /// JSON scene table used to name map ids
    pub scene_file: Option<PathBuf>,
    pub chains: PointerChains,
    pub scan: ScanConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module_name: "Game.exe".to_string(),
            process_name: "Game".to_string(),
            poll_interval_ms: POLL_INTERVAL_MS,
            discovery_interval_ms: DISCOVERY_INTERVAL_MS,
            scene_file: None,
            chains: PointerChains::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = toml::from_str(&content)?;
        debug!(
            "Loaded config from {}: module={}, stats chain={}",
            path.display(),
            config.module_name,
            config.chains.stats
        );
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved config to {}", path.as_ref().display());
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_interval_ms)
    }

    /// The configured scene table, or an empty one when none is set or it fails to load.
    pub fn scenes(&self) -> SceneTable {
        match &self.scene_file {
            Some(path) => SceneTable::load_or_empty(path),
            None => SceneTable::default(),
        }
    }
}
