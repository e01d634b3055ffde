//! Poke command implementation.

use anyhow::{Context, Result, bail};
use oathwatch::{Config, MemoryAccessor, StatsWriter};

use super::attach;
use crate::cli::PokeField;

fn parse_pair<T: std::str::FromStr>(value: &str, separator: char) -> Result<(T, T)>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some((a, b)) = value.split_once(separator) else {
        bail!("Expected two values separated by '{}', got {}", separator, value);
    };
    Ok((
        a.trim().parse().with_context(|| format!("Invalid value {}", a))?,
        b.trim().parse().with_context(|| format!("Invalid value {}", b))?,
    ))
}

pub fn run(config: &Config, pid: Option<u32>, field: PokeField, value: &str) -> Result<()> {
    let process = attach(config, pid)?;
    let memory = MemoryAccessor::new(&process);
    let writer = StatsWriter::new(&memory, &config.chains);

    match field {
        PokeField::Level => writer.set_level(value.parse().context("Invalid level")?)?,
        PokeField::Experience => {
            writer.set_experience(value.parse().context("Invalid experience")?)?
        }
        PokeField::Hp => {
            let (current, max) = parse_pair(value, '/')?;
            writer.set_hp(current, max)?
        }
        PokeField::Mp => {
            let (current, max) = parse_pair(value, '/')?;
            writer.set_mp(current, max)?
        }
        PokeField::Position => {
            let (x, y) = parse_pair(value, ',')?;
            writer.set_position(x, y)?
        }
        PokeField::Name => writer.set_name(value)?,
    }
    println!("Wrote {} to process {}", value, process.pid);
    Ok(())
}
