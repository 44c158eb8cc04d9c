//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::executor::protocol::PurgeOptions;
use crate::model::{IncidentId, IncidentStatus, NewIncident};

#[derive(Parser, Debug)]
#[command(name = "incident-desk")]
#[command(version, about = "Track incidents against the incident API")]
pub struct Cli {
    /// Config file (default: ~/.config/incident-desk/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Override api.base_url
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Bypass the response cache for reads
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List incidents
    List {
        /// Only incidents in this status (pendiente, en_progreso, resuelto)
        #[arg(long, value_parser = parse_status)]
        status: Option<IncidentStatus>,
    },
    /// Show one incident
    Show { id: IncidentId },
    /// Report a new incident
    Create(CreateArgs),
    /// Change an incident's status
    Status {
        id: IncidentId,
        #[arg(value_parser = parse_status)]
        status: IncidentStatus,
    },
    /// Delete an incident
    Delete { id: IncidentId },
    /// Inspect or purge the response cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
    /// Show or change the persisted dark-mode preference
    DarkMode {
        #[arg(value_enum)]
        mode: Option<DarkModeArg>,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub reported_by: Option<String>,
}

impl From<CreateArgs> for NewIncident {
    fn from(args: CreateArgs) -> Self {
        NewIncident {
            title: args.title,
            description: args.description,
            priority: args.priority,
            location: args.location,
            reported_by: args.reported_by,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print cache size and keys
    Stats,
    /// Evict entries; with no option the whole cache is cleared
    Purge {
        /// Exact URL of a cached GET
        #[arg(long, conflicts_with_all = ["pattern", "older_than"])]
        url: Option<String>,
        /// Regex matched against "METHOD:URL" keys
        #[arg(long, conflicts_with = "older_than")]
        pattern: Option<String>,
        /// Entries older than this many milliseconds
        #[arg(long, value_name = "MS")]
        older_than: Option<u64>,
    },
}

impl CacheCommand {
    pub fn purge_options(&self) -> Option<PurgeOptions> {
        match self {
            CacheCommand::Stats => None,
            CacheCommand::Purge {
                url,
                pattern,
                older_than,
            } => Some(PurgeOptions {
                url: url.clone(),
                pattern: pattern.clone(),
                older_than_ms: *older_than,
            }),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DarkModeArg {
    On,
    Off,
    Toggle,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
    }
}

fn parse_status(value: &str) -> Result<IncidentStatus, String> {
    value.parse()
}
