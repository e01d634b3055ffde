mod cli;
mod commands;
mod input;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use oathwatch::{Config, ShutdownSignal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "oathwatch=debug" } else { "oathwatch=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.parse()?))
        .with_writer(std::io::stderr)
        .init();

    if let Command::InitConfig { force } = cli.command {
        return commands::init_config::run(&cli.config, force);
    }

    let config = Config::load(&cli.config)?;

    // Long scans and loops stop on Ctrl+C
    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        shutdown_ctrlc.trigger();
    })?;

    let pid = cli.pid;
    match cli.command {
        Command::List => commands::list::run(&config),
        Command::Snapshot { json } => commands::snapshot::run(&config, pid, json),
        Command::Watch => commands::watch::run(&config, pid, shutdown),
        Command::Diagnose { json, output } => {
            commands::diagnose::run(&config, pid, json, output.as_deref())
        }
        Command::ScanBases { ranges, apply } => {
            commands::scan::bases(&config, &cli.config, pid, &ranges, apply, &shutdown)
        }
        Command::ScanMap { head } => commands::scan::map(&config, pid, head.as_deref(), &shutdown),
        Command::FindText {
            text,
            encoding,
            limit,
        } => commands::find::text(&config, pid, &text, &encoding, limit, &shutdown),
        Command::FindPointers { address, limit } => {
            commands::find::pointers(&config, pid, &address, limit, &shutdown)
        }
        Command::FindPattern {
            pattern,
            region,
            limit,
        } => commands::find::pattern(&config, pid, &pattern, region.as_deref(), limit, &shutdown),
        Command::FindValue {
            value,
            save,
            narrow,
        } => commands::find::value(
            &config,
            pid,
            value,
            save.as_deref(),
            narrow.as_deref(),
            &shutdown,
        ),
        Command::Hexdump {
            address,
            size,
            ascii,
        } => commands::hexdump::run(&config, pid, &address, size, ascii),
        Command::Fields {
            chain,
            from,
            to,
            step,
            kind,
        } => commands::fields::run(&config, pid, &chain, from..=to, step, kind, &shutdown),
        Command::Skill {
            slots,
            interval_ms,
            repeat,
        } => commands::skill::run(&config, pid, &slots, interval_ms, repeat, shutdown),
        Command::Poke { field, value } => commands::poke::run(&config, pid, field, &value),
        Command::InitConfig { .. } => Ok(()),
    }
}
