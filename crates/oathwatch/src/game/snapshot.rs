use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::debug;

use super::pet::{PetRecord, read_pet};
use super::scene::SceneTable;
use super::status::{HealthStatus, LoginState, percent};
use crate::memory::ReadMemory;
use crate::memory::layout::{entity, map, stats};
use crate::offset::{PointerChain, PointerChains};

/// Fields read from the stats record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterStats {
    pub name: String,
    pub level: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub experience: i32,
    pub pet_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapInfo {
    pub id: i32,
    pub name: Option<String>,
}

/// One poll of one character. `None` means the record's chain did not resolve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterSnapshot {
    pub pid: u32,
    pub captured_at: DateTime<Local>,
    pub stats: Option<CharacterStats>,
    pub position: Option<Position>,
    pub map: Option<MapInfo>,
    pub pet: Option<PetRecord>,
    /// Field reads that failed and were left at zero.
    pub read_failures: u32,
}

impl CharacterSnapshot {
    pub fn name(&self) -> Option<&str> {
        self.stats.as_ref().map(|s| s.name.as_str())
    }

    pub fn hp_percent(&self) -> Option<i32> {
        self.stats.as_ref().map(|s| percent(s.hp, s.max_hp))
    }

    pub fn mp_percent(&self) -> Option<i32> {
        self.stats.as_ref().map(|s| percent(s.mp, s.max_mp))
    }

    pub fn health(&self) -> Option<HealthStatus> {
        self.hp_percent().map(HealthStatus::from_percent)
    }

    pub fn login_state(&self) -> LoginState {
        LoginState::from_name(self.name())
    }

    pub fn is_available(&self) -> bool {
        self.stats.is_some()
    }
}

/// Zero-on-failure reads that count their failures.
struct FieldReader<'r, R: ?Sized> {
    reader: &'r R,
    failures: u32,
}

impl<R: ReadMemory + ?Sized> FieldReader<'_, R> {
    fn i32(&mut self, address: u64) -> i32 {
        self.reader.read_i32(address).unwrap_or_else(|e| {
            debug!("Field read at {:#x} failed: {}", address, e);
            self.failures += 1;
            0
        })
    }

    fn f32(&mut self, address: u64) -> f32 {
        self.reader.read_f32(address).unwrap_or_else(|e| {
            debug!("Field read at {:#x} failed: {}", address, e);
            self.failures += 1;
            0.0
        })
    }
}

/// Resolve `chain` to a record base that can actually be read.
///
/// A base outside readable memory counts as unresolved, so the record is
/// reported missing instead of as a row of zeroed fields.
fn record_base<R: ReadMemory + ?Sized>(reader: &R, chain: &PointerChain) -> Option<u64> {
    let base = chain.resolve(reader).ok()?;
    match reader.read_bytes(base, 1) {
        Ok(_) => Some(base),
        Err(e) => {
            debug!("Chain {} resolved to unreadable {:#x}: {}", chain, base, e);
            None
        }
    }
}

/// Builds snapshots from one set of chains.
///
/// Every capture resolves each chain from scratch against the reader's
/// current module base; nothing is cached between polls.
pub struct SnapshotReader<'a> {
    chains: &'a PointerChains,
    scenes: Option<&'a SceneTable>,
}

impl<'a> SnapshotReader<'a> {
    pub fn new(chains: &'a PointerChains) -> Self {
        Self {
            chains,
            scenes: None,
        }
    }

    pub fn with_scenes(mut self, scenes: &'a SceneTable) -> Self {
        self.scenes = Some(scenes);
        self
    }

    pub fn capture<R: ReadMemory + ?Sized>(&self, reader: &R, pid: u32) -> CharacterSnapshot {
        let mut fields = FieldReader {
            reader,
            failures: 0,
        };

        let stats = record_base(reader, &self.chains.stats).map(|base| CharacterStats {
                name: reader.read_fixed_string(base + stats::NAME, stats::NAME_LEN),
                level: fields.i32(base + stats::LEVEL),
                hp: fields.i32(base + stats::HP),
                max_hp: fields.i32(base + stats::MAX_HP),
                mp: fields.i32(base + stats::MP),
                max_mp: fields.i32(base + stats::MAX_MP),
                experience: fields.i32(base + stats::EXPERIENCE),
                pet_id: fields.i32(base + stats::PET_ID),
            });

        let position = record_base(reader, &self.chains.entity).map(|base| Position {
            x: fields.f32(base + entity::X),
            y: fields.f32(base + entity::Y),
        });

        let map = record_base(reader, &self.chains.map).map(|base| {
            let id = fields.i32(base + map::MAP_ID);
            MapInfo {
                id,
                name: self.scenes.map(|scenes| scenes.name(id).to_string()),
            }
        });

        let pet = stats
            .as_ref()
            .filter(|s| s.pet_id > 0)
            .and_then(|s| read_pet(reader, &self.chains.pet, s.pet_id));

        CharacterSnapshot {
            pid,
            captured_at: Local::now(),
            stats,
            position,
            map,
            pet,
            read_failures: fields.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::memory::{MOCK_MODULE_BASE, MockMemoryBuilder};

    const STATS: u64 = 0x0500_0000;

    /// Stats chain [2381824, 12, 340, 4] and entity chain [2381824, 12]
    /// share their first two hops.
    fn fixture() -> MockMemoryBuilder {
        let head = MOCK_MODULE_BASE + 2381824;
        let mut name = codec::encode("Liễ Như Yên");
        name.resize(stats::NAME_LEN, 0);

        MockMemoryBuilder::new()
            .readonly(head, 0x4000)
            .pointer_at(head, 0x0100_0000)
            .writable(0x0100_0000, 0x200)
            .pointer_at(0x0100_000C, 0x0200_0000)
            .writable(0x0200_0000, 0x200)
            .f32_at(0x0200_0000 + entity::X, 153.5)
            .f32_at(0x0200_0000 + entity::Y, 88.0)
            .pointer_at(0x0200_0154, 0x0300_0000)
            .writable(0x0300_0000, 0x10)
            .pointer_at(0x0300_0004, STATS)
            .writable(STATS, 0x1000)
            .bytes_at(STATS + stats::NAME, &name)
            .i32_at(STATS + stats::LEVEL, 87)
            .i32_at(STATS + stats::HP, 4500)
            .i32_at(STATS + stats::MAX_HP, 6000)
            .i32_at(STATS + stats::MP, 300)
            .i32_at(STATS + stats::MAX_MP, 1200)
            .i32_at(STATS + stats::EXPERIENCE, 123_456)
    }

    #[test]
    fn test_end_to_end_stats_chain() {
        let memory = fixture().build();
        let chains = PointerChains::default();

        assert_eq!(chains.stats.follow(&memory), STATS);

        let snapshot = SnapshotReader::new(&chains).capture(&memory, 1234);
        let stats = snapshot.stats.as_ref().unwrap();
        assert_eq!(stats.name, "Liễ Như Yên");
        assert_eq!(stats.level, 87);
        assert_eq!(stats.hp, 4500);
        assert_eq!(stats.max_hp, 6000);
        assert_eq!(stats.mp, 300);
        assert_eq!(stats.max_mp, 1200);
        assert_eq!(stats.experience, 123_456);

        assert_eq!(snapshot.hp_percent(), Some(75));
        assert_eq!(snapshot.mp_percent(), Some(25));
        assert_eq!(snapshot.health(), Some(HealthStatus::Healthy));
        assert_eq!(snapshot.login_state(), LoginState::InGame);
        assert_eq!(snapshot.position, Some(Position { x: 153.5, y: 88.0 }));
        assert_eq!(snapshot.read_failures, 0);
    }

    #[test]
    fn test_broken_map_chain_leaves_other_records() {
        let memory = fixture().build();
        let chains = PointerChains::default();
        let snapshot = SnapshotReader::new(&chains).capture(&memory, 1);

        // 0x0100_0000 + 13692 is outside the mapped object
        assert!(snapshot.map.is_none());
        assert!(snapshot.pet.is_none());
        assert!(snapshot.is_available());
    }

    #[test]
    fn test_map_name_from_scene_table() {
        let memory = fixture()
            .writable(0x0100_0000 + 13692, 4)
            .pointer_at(0x0100_0000 + 13692, 0x0400_0000)
            .writable(0x0400_0000, 0x100)
            .i32_at(0x0400_0000 + map::MAP_ID, 37)
            .build();
        let chains = PointerChains::default();
        let scenes = SceneTable::from_json(r#"[{"clientres": 37, "name": "Tô Châu"}]"#).unwrap();

        let snapshot = SnapshotReader::new(&chains)
            .with_scenes(&scenes)
            .capture(&memory, 1);
        let map = snapshot.map.unwrap();
        assert_eq!(map.id, 37);
        assert_eq!(map.name.as_deref(), Some("Tô Châu"));
    }

    #[test]
    fn test_unresolved_stats_is_unavailable() {
        let memory = MockMemoryBuilder::new().build();
        let chains = PointerChains::default();
        let snapshot = SnapshotReader::new(&chains).capture(&memory, 1);

        assert!(!snapshot.is_available());
        assert_eq!(snapshot.login_state(), LoginState::Unavailable);
        assert_eq!(snapshot.hp_percent(), None);
        assert!(snapshot.position.is_none());
    }

    #[test]
    fn test_unreadable_record_base_is_unavailable() {
        // the last hop points at memory that is not mapped
        let head = MOCK_MODULE_BASE + 2381824;
        let memory = MockMemoryBuilder::new()
            .readonly(head, 4)
            .pointer_at(head, 0x0100_0000)
            .writable(0x0100_0000, 0x200)
            .pointer_at(0x0100_000C, 0x0200_0000)
            .writable(0x0200_0000, 0x200)
            .pointer_at(0x0200_0154, 0x0300_0000)
            .writable(0x0300_0000, 0x10)
            .pointer_at(0x0300_0004, 0x0900_0000)
            .build();
        let chains = PointerChains::default();
        let snapshot = SnapshotReader::new(&chains).capture(&memory, 1);

        assert!(snapshot.stats.is_none());
        assert!(!snapshot.is_available());
        assert_eq!(snapshot.login_state(), LoginState::Unavailable);
        assert_eq!(snapshot.read_failures, 0);
        // the entity record on the same path is still readable
        assert_eq!(snapshot.position, Some(Position { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn test_failed_field_reads_are_counted() {
        // record is mapped, but too short to reach the pools
        let head = MOCK_MODULE_BASE + 2381824;
        let mut name = codec::encode("Hero");
        name.resize(stats::NAME_LEN, 0);
        let memory = MockMemoryBuilder::new()
            .readonly(head, 4)
            .pointer_at(head, 0x0100_0000)
            .writable(0x0100_0000, 0x200)
            .pointer_at(0x0100_000C, 0x0200_0000)
            .writable(0x0200_0000, 0x200)
            .pointer_at(0x0200_0154, 0x0300_0000)
            .writable(0x0300_0000, 0x10)
            .pointer_at(0x0300_0004, STATS)
            .writable(STATS, 0x100)
            .bytes_at(STATS + stats::NAME, &name)
            .i32_at(STATS + stats::LEVEL, 12)
            .build();
        let chains = PointerChains::default();
        let snapshot = SnapshotReader::new(&chains).capture(&memory, 1);

        let stats = snapshot.stats.unwrap();
        assert_eq!(stats.name, "Hero");
        assert_eq!(stats.level, 12);
        assert_eq!(stats.hp, 0);
        // hp, max hp, mp, max mp, experience, pet id
        assert_eq!(snapshot.read_failures, 6);
    }
}
