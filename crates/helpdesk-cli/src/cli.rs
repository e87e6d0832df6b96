use clap::{Args, Parser, Subcommand};
use helpdesk_core::{Status, TicketId};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "helpdesk")]
#[command(about = "Replay and query help desk scenarios", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config directory)
    #[arg(long, global = true, env = "HELPDESK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scenario and print the full report
    Run {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Number of latest events to show
        #[arg(long, default_value = "10")]
        latest: usize,
    },

    /// Replay a scenario and list matching tickets
    Tickets {
        /// Scenario file (TOML)
        scenario: PathBuf,

        #[command(flatten)]
        filter: TicketFilter,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replay a scenario and print resolution averages
    Stats {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replay a scenario and print one ticket's history
    History {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Ticket ID
        ticket: TicketId,
    },
}

/// Ticket query options. All given options must match.
#[derive(Args, Debug, Default)]
pub struct TicketFilter {
    /// Only tickets in this status
    #[arg(long)]
    pub status: Option<Status>,

    /// Only tickets not in this status
    #[arg(long)]
    pub not_status: Option<Status>,

    /// Only tickets assigned to this technician ID
    #[arg(long)]
    pub technician: Option<String>,

    /// Only tickets carrying any of these tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Only tickets whose description or history mentions this text
    #[arg(long)]
    pub text: Option<String>,
}
