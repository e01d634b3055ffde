//! Plausibility checks for resolved records.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::utils::is_valid_name;
use crate::memory::ReadMemory;
use crate::memory::layout::{limits, stats};

/// Why a stats record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("record unreadable at {0:#x}")]
    Unreadable(u64),
    #[error("invalid name '{0}'")]
    Name(String),
    #[error("level {0} outside {min}..={max}", min = limits::MIN_LEVEL, max = limits::MAX_LEVEL)]
    Level(i32),
    #[error("{label} {current}/{max} is implausible")]
    Pool {
        label: &'static str,
        current: i32,
        max: i32,
    },
}

/// The fields validation looks at, read once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSample {
    pub name: String,
    pub level: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
}

impl StatsSample {
    pub fn read<R: ReadMemory + ?Sized>(reader: &R, base: u64) -> Result<Self, Rejection> {
        let int = |offset: u64| {
            reader
                .read_i32(base.wrapping_add(offset))
                .map_err(|_| Rejection::Unreadable(base))
        };
        Ok(Self {
            name: reader.read_fixed_string(base.wrapping_add(stats::NAME), stats::NAME_LEN),
            level: int(stats::LEVEL)?,
            hp: int(stats::HP)?,
            max_hp: int(stats::MAX_HP)?,
            mp: int(stats::MP)?,
            max_mp: int(stats::MAX_MP)?,
        })
    }

    /// Every check must pass; the first failure is returned.
    pub fn check(&self) -> Result<(), Rejection> {
        if !is_valid_name(&self.name) {
            return Err(Rejection::Name(self.name.clone()));
        }
        if !(limits::MIN_LEVEL..=limits::MAX_LEVEL).contains(&self.level) {
            return Err(Rejection::Level(self.level));
        }
        check_pool("HP", self.hp, self.max_hp)?;
        check_pool("MP", self.mp, self.max_mp)?;
        Ok(())
    }

    /// Count of fields carrying live data; ranks candidates that all passed.
    pub fn score(&self) -> u32 {
        [
            self.level > 1,
            self.hp > 0,
            self.max_hp > 0,
            self.mp > 0,
            self.max_mp > 0,
            self.name.chars().count() > 1,
        ]
        .into_iter()
        .filter(|&live| live)
        .count() as u32
    }

    pub fn summary(&self) -> String {
        format!(
            "{} Lv{} HP {}/{} MP {}/{}",
            self.name, self.level, self.hp, self.max_hp, self.mp, self.max_mp
        )
    }
}

fn check_pool(label: &'static str, current: i32, max: i32) -> Result<(), Rejection> {
    if current < 0 || max < 0 || current > max || max > limits::MAX_POOL {
        return Err(Rejection::Pool {
            label,
            current,
            max,
        });
    }
    Ok(())
}

/// Read and check the stats record at `base`.
pub fn check_stats_record<R: ReadMemory + ?Sized>(
    reader: &R,
    base: u64,
) -> Result<StatsSample, Rejection> {
    let sample = StatsSample::read(reader, base)?;
    sample.check()?;
    Ok(sample)
}

/// Whether `base` looks like a live stats record.
pub fn validate_stats_record<R: ReadMemory + ?Sized>(reader: &R, base: u64) -> bool {
    match check_stats_record(reader, base) {
        Ok(sample) => {
            debug!("Valid stats at {:#x}: {}", base, sample.summary());
            true
        }
        Err(rejection) => {
            debug!("Rejected stats at {:#x}: {}", base, rejection);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::memory::MockMemoryBuilder;

    const BASE: u64 = 0x0500_0000;

    fn record(name: &str, level: i32, hp: (i32, i32), mp: (i32, i32)) -> crate::memory::MockMemory {
        let mut name_bytes = codec::encode(name);
        name_bytes.resize(stats::NAME_LEN, 0);
        MockMemoryBuilder::new()
            .writable(BASE, 0x1000)
            .bytes_at(BASE + stats::NAME, &name_bytes)
            .i32_at(BASE + stats::LEVEL, level)
            .i32_at(BASE + stats::HP, hp.0)
            .i32_at(BASE + stats::MAX_HP, hp.1)
            .i32_at(BASE + stats::MP, mp.0)
            .i32_at(BASE + stats::MAX_MP, mp.1)
            .build()
    }

    #[test]
    fn test_level_boundaries() {
        assert!(validate_stats_record(&record("Hero", 1, (10, 10), (5, 5)), BASE));
        assert!(validate_stats_record(&record("Hero", 150, (10, 10), (5, 5)), BASE));
        assert!(!validate_stats_record(&record("Hero", 0, (10, 10), (5, 5)), BASE));
        assert!(!validate_stats_record(&record("Hero", 151, (10, 10), (5, 5)), BASE));
    }

    #[test]
    fn test_pool_boundaries() {
        assert!(validate_stats_record(&record("Hero", 10, (0, 0), (0, 0)), BASE));
        assert!(!validate_stats_record(&record("Hero", 10, (11, 10), (0, 0)), BASE));
        assert!(!validate_stats_record(&record("Hero", 10, (5, 1_000_001), (0, 0)), BASE));
        assert!(validate_stats_record(&record("Hero", 10, (5, 1_000_000), (0, 0)), BASE));
        assert!(!validate_stats_record(&record("Hero", 10, (-1, 10), (0, 0)), BASE));
        assert!(!validate_stats_record(&record("Hero", 10, (1, 1), (9, 8)), BASE));
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_stats_record(&record("Liễ Như Yên", 10, (1, 1), (1, 1)), BASE));
        assert!(!validate_stats_record(&record("", 10, (1, 1), (1, 1)), BASE));
        assert!(!validate_stats_record(&record("a#b", 10, (1, 1), (1, 1)), BASE));
        assert!(!validate_stats_record(&record(&"n".repeat(21), 10, (1, 1), (1, 1)), BASE));
    }

    #[test]
    fn test_rejection_reason_and_unreadable() {
        let memory = record("Hero", 0, (1, 1), (1, 1));
        assert_eq!(check_stats_record(&memory, BASE), Err(Rejection::Level(0)));
        assert_eq!(
            check_stats_record(&memory, 0x0900_0000),
            Err(Rejection::Unreadable(0x0900_0000))
        );
    }

    #[test]
    fn test_score_prefers_live_records() {
        let live = check_stats_record(&record("Hero", 40, (100, 120), (30, 50)), BASE).unwrap();
        let empty = check_stats_record(&record("H", 1, (0, 0), (0, 0)), BASE).unwrap();
        assert_eq!(live.score(), 6);
        assert_eq!(empty.score(), 0);
    }
}
