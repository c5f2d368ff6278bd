use clap::Parser;
use std::path::PathBuf;

/// Automated mine attack system.
#[derive(Debug, Parser)]
#[command(
    name = "mine-raider",
    version,
    after_help = "Examples:\n  mine-raider -u John -p 484Fire\n  mine-raider -u Jane -p 500Archer -s 50\n  mine-raider --username Bob --power 450Earth --searches 0"
)]
pub struct Args {
    /// Player username
    #[arg(short, long)]
    pub username: String,

    /// Top troop power and type (e.g. 484Fire)
    #[arg(short, long)]
    pub power: String,

    /// Maximum number of searches (0 or less for unlimited)
    #[arg(short, long, default_value_t = 30, allow_negative_numbers = true)]
    pub searches: i64,

    /// Countdown in seconds before starting
    #[arg(short, long, default_value_t = 2)]
    pub delay: u64,

    /// JSON file overriding delays, timeouts and distances
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// CSV file that run statistics are appended to
    #[arg(short = 'o', long, default_value = "mine_attack_statistics.csv")]
    pub log: PathBuf,
}
