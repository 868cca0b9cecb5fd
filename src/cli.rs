use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use stats_api::{Collection, CompetitionType};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "courtstats", version, about = "Basketball team and player stat pages")]
pub struct Cli {
    /// Data root: a directory, or an http(s) URL serving the same layout.
    #[arg(long, global = true, env = "COURTSTATS_DATA", default_value = "data")]
    pub data: String,

    /// How many leaders / records to show per category.
    #[arg(long, global = true, env = "COURTSTATS_TOP", default_value_t = 5)]
    pub top: usize,

    /// Per-request timeout when the data root is a URL.
    #[arg(long, global = true, env = "COURTSTATS_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Print pages as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// -v for info, -vv for debug. RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List every team.
    Teams,
    /// Roster, schedule, leaders and records for one team.
    Team {
        /// Team identifier or display name.
        team: String,
        /// Season label, e.g. 2024-25. Defaults to the most recent one on file.
        #[arg(long)]
        season: Option<String>,
        #[arg(long = "type", default_value = "regular")]
        kind: CompetitionType,
    },
    /// Season averages and game log for one player.
    Player {
        /// Player identifier or display name.
        player: String,
    },
    /// Score and boxscore for one game.
    Game { id: String },
    /// Recompute player totals, team leaders and team records from boxscores.
    Rebuild,
    /// Print one collection as loaded.
    Dump { collection: Collection },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataLocation {
    Http(String),
    Dir(PathBuf),
}

impl DataLocation {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DataLocation::Http(raw.to_owned())
        } else {
            DataLocation::Dir(PathBuf::from(raw))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data: DataLocation,
    pub top: usize,
    pub timeout: Duration,
    pub json: bool,
    pub log_level: LevelFilter,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        let log_level = match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        };
        Self {
            data: DataLocation::parse(&cli.data),
            top: cli.top.max(1),
            timeout: Duration::from_secs(cli.timeout_secs.max(1)),
            json: cli.json,
            log_level,
        }
    }
}
