//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod context;
pub mod insights;
pub mod records;
pub mod status;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// CropSync CLI - offline-tolerant companion for the farm management API
#[derive(Parser, Debug)]
#[command(name = "cropsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "CROPSYNC_FORMAT",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: Option<OutputFormat>,

    /// Override config file location
    #[arg(long, global = true, env = "CROPSYNC_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Scope commands to one farm
    #[arg(long, global = true, env = "CROPSYNC_FARM_ID", hide_env = true)]
    pub farm: Option<u64>,

    /// Override the API base URL
    #[arg(long, global = true, env = "CROPSYNC_API_URL", hide_env = true)]
    pub api_url: Option<String>,

    /// Bypass cache, fetch fresh data from API
    #[arg(long, global = true, env = "CROPSYNC_NO_CACHE", hide_env = true)]
    pub no_cache: bool,

    /// Enable debug logging
    #[arg(long, global = true, env = "CROPSYNC_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show configuration and connectivity status
    Status,

    /// Display version information
    Version,

    /// List and change crop stage records
    #[command(subcommand)]
    Records(RecordsCommands),

    /// Summary statistics for the current scope
    Analytics,

    /// Stage, harvest and health alerts for the current scope
    Alerts {
        /// Hide an alert by id (repeatable)
        #[arg(long, value_name = "ID")]
        dismiss: Vec<String>,
    },
}

/// Crop stage record subcommands
#[derive(Subcommand, Debug)]
pub enum RecordsCommands {
    /// List crop stage records
    #[command(visible_alias = "ls")]
    List {
        /// Include completed stages
        #[arg(long)]
        history: bool,
    },

    /// Create a record from a YAML or JSON file
    Create {
        /// Path to the record file
        #[arg(long, short = 'f')]
        file: PathBuf,
    },

    /// Replace a record's fields from a YAML or JSON file
    Update {
        /// Record ID
        id: u64,

        /// Path to the record file
        #[arg(long, short = 'f')]
        file: PathBuf,
    },

    /// Delete a record
    Delete {
        /// Record ID
        id: u64,
    },
}
