use std::path::Path;

use anyhow::{Result, bail};
use oathwatch::Config;

pub fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save(path)?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}
