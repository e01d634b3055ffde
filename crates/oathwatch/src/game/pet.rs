//! Pet roster table.
//!
//! The table is an array of fixed-size records behind the pet chain. A record
//! whose id-check is 0 ends the live part of the table.

use serde::Serialize;
use tracing::debug;

use super::status::percent;
use crate::error::Result;
use crate::memory::ReadMemory;
use crate::memory::layout::pet;
use crate::offset::PointerChain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PetRecord {
    pub slot: usize,
    pub id: i32,
    pub hp: i32,
    pub max_hp: i32,
}

impl PetRecord {
    /// 0 when the max is unknown.
    pub fn hp_percent(&self) -> i32 {
        if self.max_hp > 0 {
            percent(self.hp, self.max_hp)
        } else {
            0
        }
    }
}

fn slot_address(table: u64, slot: usize) -> u64 {
    table + slot as u64 * pet::RECORD_SIZE
}

fn read_slot<R: ReadMemory + ?Sized>(reader: &R, table: u64, slot: usize) -> Result<PetRecord> {
    let base = slot_address(table, slot);
    Ok(PetRecord {
        slot,
        id: reader.read_i32(base + pet::ID_CHECK)?,
        hp: reader.read_i32(base + pet::HP)?,
        max_hp: reader.read_i32(base + pet::MAX_HP)?,
    })
}

/// Every live record of the table at `table`.
pub fn read_pet_roster<R: ReadMemory + ?Sized>(reader: &R, table: u64) -> Vec<PetRecord> {
    let mut roster = Vec::new();
    for slot in 0..pet::MAX_RECORDS {
        match read_slot(reader, table, slot) {
            Ok(record) if record.id == 0 => break,
            Ok(record) => roster.push(record),
            Err(e) => {
                debug!("Pet slot {} unreadable: {}", slot, e);
                break;
            }
        }
    }
    roster
}

/// Find the record for `pet_id` in the table at `table`.
pub fn find_pet<R: ReadMemory + ?Sized>(reader: &R, table: u64, pet_id: i32) -> Option<PetRecord> {
    if pet_id <= 0 {
        return None;
    }
    for slot in 0..pet::MAX_RECORDS {
        let id = reader.read_i32(slot_address(table, slot) + pet::ID_CHECK).ok()?;
        if id == pet_id {
            return read_slot(reader, table, slot).ok();
        }
        if id == 0 {
            break;
        }
    }
    None
}

/// Resolve the pet chain and look `pet_id` up.
pub fn read_pet<R: ReadMemory + ?Sized>(
    reader: &R,
    chain: &PointerChain,
    pet_id: i32,
) -> Option<PetRecord> {
    let table = chain.resolve(reader).ok()?;
    find_pet(reader, table, pet_id)
}
