//! Stat and position writes, for setting up test scenarios against a live client.
//!
//! Each call resolves its chain fresh; a broken chain fails the write before
//! anything is written.

use tracing::info;

use crate::error::Result;
use crate::memory::layout::{entity, stats};
use crate::memory::{ReadMemory, WriteMemory};
use crate::offset::PointerChains;

pub struct StatsWriter<'a, M: ReadMemory + WriteMemory + ?Sized> {
    memory: &'a M,
    chains: &'a PointerChains,
}

impl<'a, M: ReadMemory + WriteMemory + ?Sized> StatsWriter<'a, M> {
    pub fn new(memory: &'a M, chains: &'a PointerChains) -> Self {
        Self { memory, chains }
    }

    fn stats_base(&self) -> Result<u64> {
        self.chains.stats.resolve(self.memory)
    }

    pub fn set_level(&self, level: i32) -> Result<()> {
        let base = self.stats_base()?;
        self.memory.write_i32(base + stats::LEVEL, level)?;
        info!("Level set to {}", level);
        Ok(())
    }

    pub fn set_experience(&self, experience: i32) -> Result<()> {
        let base = self.stats_base()?;
        self.memory.write_i32(base + stats::EXPERIENCE, experience)?;
        info!("Experience set to {}", experience);
        Ok(())
    }

    pub fn set_hp(&self, current: i32, max: i32) -> Result<()> {
        let base = self.stats_base()?;
        self.memory.write_i32(base + stats::HP, current)?;
        self.memory.write_i32(base + stats::MAX_HP, max)?;
        info!("HP set to {}/{}", current, max);
        Ok(())
    }

    pub fn set_mp(&self, current: i32, max: i32) -> Result<()> {
        let base = self.stats_base()?;
        self.memory.write_i32(base + stats::MP, current)?;
        self.memory.write_i32(base + stats::MAX_MP, max)?;
        info!("MP set to {}/{}", current, max);
        Ok(())
    }

    pub fn set_position(&self, x: f32, y: f32) -> Result<()> {
        let base = self.chains.entity.resolve(self.memory)?;
        self.memory.write_f32(base + entity::X, x)?;
        self.memory.write_f32(base + entity::Y, y)?;
        info!("Position set to ({}, {})", x, y);
        Ok(())
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        let base = self.stats_base()?;
        self.memory
            .write_fixed_string(base + stats::NAME, name, stats::NAME_LEN)?;
        info!("Name set to {}", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::game::SnapshotReader;
    use crate::memory::{MOCK_MODULE_BASE, MockMemoryBuilder};

    fn process() -> crate::memory::MockMemory {
        let head = MOCK_MODULE_BASE + 2381824;
        MockMemoryBuilder::new()
            .readonly(head, 4)
            .pointer_at(head, 0x0100_0000)
            .writable(0x0100_0000, 0x200)
            .pointer_at(0x0100_000C, 0x0200_0000)
            .writable(0x0200_0000, 0x200)
            .pointer_at(0x0200_0154, 0x0300_0000)
            .writable(0x0300_0000, 0x10)
            .pointer_at(0x0300_0004, 0x0500_0000)
            .writable(0x0500_0000, 0x1000)
            .build()
    }

    #[test]
    fn test_writes_show_up_in_snapshot() {
        let memory = process();
        let chains = PointerChains::default();
        let writer = StatsWriter::new(&memory, &chains);

        writer.set_name("Đăng nhập").unwrap();
        writer.set_level(150).unwrap();
        writer.set_hp(10, 40).unwrap();
        writer.set_mp(0, 0).unwrap();
        writer.set_experience(i32::MAX).unwrap();
        writer.set_position(-1.25, 300.0).unwrap();

        let snapshot = SnapshotReader::new(&chains).capture(&memory, 7);
        let stats = snapshot.stats.as_ref().unwrap();
        assert_eq!(stats.name, "Đăng nhập");
        assert_eq!(stats.level, 150);
        assert_eq!((stats.hp, stats.max_hp), (10, 40));
        assert_eq!(stats.experience, i32::MAX);
        assert_eq!(snapshot.hp_percent(), Some(25));
        assert_eq!(snapshot.mp_percent(), Some(100));
        let position = snapshot.position.unwrap();
        assert_eq!((position.x, position.y), (-1.25, 300.0));
        assert_eq!(
            snapshot.login_state(),
            crate::game::LoginState::LoginScreen
        );
    }

    #[test]
    fn test_broken_chain_fails_write() {
        let memory = MockMemoryBuilder::new()
            .readonly(MOCK_MODULE_BASE + 2381824, 4)
            .build();
        let chains = PointerChains::default();
        let writer = StatsWriter::new(&memory, &chains);

        assert!(matches!(
            writer.set_level(5),
            Err(Error::ChainBroken { step: 0, .. })
        ));
    }
}
