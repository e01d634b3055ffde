use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use oathwatch::config::CONFIG_FILE;

#[derive(Parser)]
#[command(name = "oathwatch")]
#[command(about = "Dragon Oath client monitor and memory toolkit")]
#[command(version)]
pub struct Cli {
    /// Settings file
    #[arg(short, long, global = true, default_value = CONFIG_FILE, env = "OATHWATCH_CONFIG")]
    pub config: PathBuf,

    /// Target process ID (defaults to the first process named in the config)
    #[arg(short, long, global = true)]
    pub pid: Option<u32>,

    /// Debug-level logging unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List running game clients and who is logged in
    List,
    /// Read one snapshot of a character
    Snapshot {
        #[arg(long)]
        json: bool,
    },
    /// Poll every client (or just --pid) until Esc, q or Ctrl+C
    Watch,
    /// Check every configured chain and the stats record
    Diagnose {
        #[arg(long)]
        json: bool,
        /// Also write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Brute-force the stats chain head after a client update
    ScanBases {
        /// Module-relative START:LEN spans to try (decimal or 0x hex)
        #[arg(long = "range", value_name = "START:LEN")]
        ranges: Vec<String>,
        /// Write the best head into the stats and entity chains of the config
        #[arg(long)]
        apply: bool,
    },
    /// Look for map chains around a working head
    ScanMap {
        /// Head to search around (defaults to the stats chain head)
        #[arg(long)]
        head: Option<String>,
    },
    /// Search memory for a string
    FindText {
        text: String,
        #[arg(short, long, default_value = "viscii")]
        encoding: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Search writable memory for pointers to an address
    FindPointers {
        /// Target address (hex)
        address: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Search memory for a byte pattern such as "8B 0D ?? ?? ?? ?? 85 C9"
    FindPattern {
        pattern: String,
        /// Only search ADDR:LEN (hex address, decimal or 0x length)
        #[arg(long, value_name = "ADDR:LEN")]
        region: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Find addresses holding an i32 value, optionally narrowing an earlier result
    FindValue {
        #[arg(allow_hyphen_values = true)]
        value: i32,
        /// Save the matching addresses as JSON
        #[arg(long)]
        save: Option<PathBuf>,
        /// Only re-check the addresses saved in this file
        #[arg(long)]
        narrow: Option<PathBuf>,
    },
    /// Dump raw memory
    Hexdump {
        /// Address (hex)
        address: String,
        #[arg(short, long, default_value = "256")]
        size: usize,
        /// Show an ASCII column
        #[arg(short, long)]
        ascii: bool,
    },
    /// List non-empty fields of a record reached through a chain
    Fields {
        /// entity, stats, map, legacy-map or pet
        chain: String,
        #[arg(long, default_value = "0")]
        from: u64,
        #[arg(long, default_value = "4096")]
        to: u64,
        #[arg(long, default_value = "4")]
        step: u64,
        #[arg(long = "type", value_enum, default_value = "int")]
        kind: FieldType,
    },
    /// Press skill keys F1..F12 by slot (0..=11)
    Skill {
        #[arg(required = true)]
        slots: Vec<u8>,
        /// Pause after each key
        #[arg(long, default_value = "200")]
        interval_ms: u64,
        /// Repeat the combo until Esc, q or Ctrl+C
        #[arg(long)]
        repeat: bool,
    },
    /// Write a character field
    Poke {
        #[arg(value_enum)]
        field: PokeField,
        /// Number, CUR/MAX for hp and mp, X,Y for position, text for name
        value: String,
    },
    /// Write the default settings file
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FieldType {
    Int,
    Float,
    String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PokeField {
    Level,
    Experience,
    Hp,
    Mp,
    Position,
    Name,
}
