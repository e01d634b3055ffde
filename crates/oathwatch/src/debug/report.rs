use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::memory::ReadMemory;
use crate::memory::layout::entity;
use crate::offset::searcher::{ChainProbe, StatsSample, check_stats_record, test_chain};
use crate::offset::{ChainKind, ChainStep, PointerChain, PointerChains};

/// One chain as it resolved at report time.
#[derive(Debug, Clone, Serialize)]
pub struct ChainStatus {
    pub kind: ChainKind,
    pub chain: PointerChain,
    pub reliable: bool,
    pub steps: Vec<ChainStep>,
    pub probe: ChainProbe,
}

impl ChainStatus {
    fn check<R: ReadMemory + ?Sized>(reader: &R, kind: ChainKind, chain: &PointerChain) -> Self {
        Self {
            kind,
            chain: chain.clone(),
            reliable: kind.is_reliable(),
            steps: chain.trace(reader),
            probe: test_chain(reader, chain),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.probe.is_ok()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatsValidation {
    /// The stats chain did not resolve, so there was nothing to check.
    Unresolved,
    Valid { sample: StatsSample },
    Rejected { reason: String },
}

/// Whether each chain resolves and whether the stats record looks live.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub pid: u32,
    pub module_base: u64,
    pub generated_at: DateTime<Local>,
    pub chains: Vec<ChainStatus>,
    pub stats: StatsValidation,
    /// Entity position, when the entity chain resolved and both reads succeeded.
    pub position: Option<(f32, f32)>,
}

impl DiagnosticReport {
    pub fn generate<R: ReadMemory + ?Sized>(reader: &R, pid: u32, chains: &PointerChains) -> Self {
        let statuses: Vec<ChainStatus> = chains
            .iter()
            .map(|(kind, chain)| ChainStatus::check(reader, kind, chain))
            .collect();

        let stats = match statuses
            .iter()
            .find(|s| s.kind == ChainKind::Stats && s.is_ok())
        {
            None => StatsValidation::Unresolved,
            Some(status) => match check_stats_record(reader, status.probe.resolved) {
                Ok(sample) => StatsValidation::Valid { sample },
                Err(rejection) => StatsValidation::Rejected {
                    reason: rejection.to_string(),
                },
            },
        };

        let position = statuses
            .iter()
            .find(|s| s.kind == ChainKind::Entity && s.is_ok())
            .and_then(|s| {
                let x = reader.read_f32(s.probe.resolved + entity::X).ok()?;
                let y = reader.read_f32(s.probe.resolved + entity::Y).ok()?;
                Some((x, y))
            });

        let report = Self {
            pid,
            module_base: reader.base_address(),
            generated_at: Local::now(),
            chains: statuses,
            stats,
            position,
        };
        info!(
            "Diagnostics for pid {}: {}/{} chains ok",
            pid,
            report.chains.iter().filter(|c| c.is_ok()).count(),
            report.chains.len()
        );
        report
    }

    pub fn chain(&self, kind: ChainKind) -> Option<&ChainStatus> {
        self.chains.iter().find(|c| c.kind == kind)
    }

    /// All reliable chains resolve and the stats record validates.
    pub fn is_healthy(&self) -> bool {
        self.chains.iter().filter(|c| c.reliable).all(|c| c.is_ok())
            && matches!(self.stats, StatsValidation::Valid { .. })
    }

    pub fn recommendation(&self) -> &'static str {
        let stats_ok = self.chain(ChainKind::Stats).is_some_and(|c| c.is_ok());
        match &self.stats {
            StatsValidation::Valid { .. } if self.is_healthy() => {
                "All chains resolve; offsets are current"
            }
            StatsValidation::Valid { .. } => {
                "Stats are valid but some chains are broken; run scan-map or update them"
            }
            StatsValidation::Rejected { .. } => {
                "Stats chain resolves to garbage; the game was likely updated, run scan-bases"
            }
            StatsValidation::Unresolved if stats_ok => "Stats record could not be checked",
            StatsValidation::Unresolved => {
                "Stats chain is broken; log in a character or run scan-bases"
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        info!("Diagnostic report saved to {}", path.as_ref().display());
        Ok(())
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} pid {} (module base {:#x}) at {}",
            "Diagnostics".bold(),
            self.pid,
            self.module_base,
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f)?;

        for status in &self.chains {
            let verdict = if status.is_ok() {
                "OK".green().to_string()
            } else if status.probe.resolved != 0 {
                "INVALID".yellow().to_string()
            } else {
                "FAILED".red().to_string()
            };
            let note = if status.reliable { "" } else { " (unreliable)" };
            writeln!(
                f,
                "  {:<11} {:<24} {:>8} -> {:#010x}{}",
                status.kind.to_string(),
                status.chain.to_string(),
                verdict,
                status.probe.resolved,
                note.dimmed()
            )?;
            for (i, step) in status.steps.iter().enumerate() {
                match step.pointer {
                    Some(pointer) => {
                        writeln!(f, "      [{}] {:#010x} -> {:#010x}", i, step.address, pointer)?
                    }
                    None => writeln!(f, "      [{}] {:#010x} -> {}", i, step.address, "?".red())?,
                }
            }
        }

        writeln!(f)?;
        match &self.stats {
            StatsValidation::Valid { sample } => {
                writeln!(f, "  Stats: {} {}", "valid".green(), sample.summary())?
            }
            StatsValidation::Rejected { reason } => {
                writeln!(f, "  Stats: {} ({})", "rejected".red(), reason)?
            }
            StatsValidation::Unresolved => writeln!(f, "  Stats: {}", "unresolved".red())?,
        }
        if let Some((x, y)) = self.position {
            writeln!(f, "  Position: ({:.2}, {:.2})", x, y)?;
        }
        writeln!(f)?;
        write!(f, "  {}", self.recommendation().bold())
    }
}
