//! Snapshot command implementation.

use anyhow::Result;
use oathwatch::{CharacterSnapshot, Config, MemoryAccessor, SnapshotReader};

use super::attach;

pub fn run(config: &Config, pid: Option<u32>, json: bool) -> Result<()> {
    let process = attach(config, pid)?;
    let scenes = config.scenes();
    let reader = MemoryAccessor::new(&process);

    let snapshot = SnapshotReader::new(&config.chains)
        .with_scenes(&scenes)
        .capture(&reader, process.pid);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_details(&snapshot);
    }
    Ok(())
}

/// One line per client, as shown by `list` and `watch`.
pub fn summary_line(snapshot: &CharacterSnapshot) -> String {
    let Some(stats) = &snapshot.stats else {
        return format!("[{:>6}] {}", snapshot.pid, snapshot.login_state());
    };
    let map = snapshot
        .map
        .as_ref()
        .map(|m| m.name.clone().unwrap_or_else(|| m.id.to_string()))
        .unwrap_or_else(|| "-".to_string());
    let pet = snapshot
        .pet
        .as_ref()
        .map(|p| format!(" pet {}%", p.hp_percent()))
        .unwrap_or_default();
    format!(
        "[{:>6}] {:<20} Lv{:<3} HP {:>3}% MP {:>3}% {:<8} {} {}{}",
        snapshot.pid,
        stats.name,
        stats.level,
        snapshot.hp_percent().unwrap_or(0),
        snapshot.mp_percent().unwrap_or(0),
        snapshot.health().map(|h| h.to_string()).unwrap_or_default(),
        map,
        snapshot.login_state(),
        pet
    )
}

fn print_details(snapshot: &CharacterSnapshot) {
    println!();
    println!("Captured at {}", snapshot.captured_at.format("%H:%M:%S"));
    println!("Status:     {}", snapshot.login_state());

    match &snapshot.stats {
        Some(stats) => {
            println!("Name:       {}", stats.name);
            println!("Level:      {}", stats.level);
            println!(
                "HP:         {}/{} ({}%, {})",
                stats.hp,
                stats.max_hp,
                snapshot.hp_percent().unwrap_or(0),
                snapshot.health().map(|h| h.to_string()).unwrap_or_default()
            );
            println!(
                "MP:         {}/{} ({}%)",
                stats.mp,
                stats.max_mp,
                snapshot.mp_percent().unwrap_or(0)
            );
            println!("Experience: {}", stats.experience);
        }
        None => println!("Stats:      unavailable (stats chain did not resolve)"),
    }

    match &snapshot.position {
        Some(p) => println!("Position:   ({:.2}, {:.2})", p.x, p.y),
        None => println!("Position:   unavailable"),
    }
    match &snapshot.map {
        Some(map) => println!(
            "Map:        {} ({})",
            map.id,
            map.name.as_deref().unwrap_or("no scene table")
        ),
        None => println!("Map:        unavailable"),
    }
    if let Some(pet) = &snapshot.pet {
        println!(
            "Pet:        #{} slot {} HP {}/{} ({}%)",
            pet.id,
            pet.slot,
            pet.hp,
            pet.max_hp,
            pet.hp_percent()
        );
    }
    if snapshot.read_failures > 0 {
        println!("({} field reads failed and show as 0)", snapshot.read_failures);
    }
}
