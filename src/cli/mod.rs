//! Command line for playing quests and running the progress server.
//!
//! Global flags override the loaded config; every subcommand except `serve`
//! acts on the logged-in user's session.

pub mod admin;

use crate::format::OutputFormat;
use admin::AdminCommand;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Love Quests: complete quests together, earn hearts, unlock rewards
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Base URL of the progress API, e.g. http://192.168.1.20:3001
    #[arg(short, long, global = true)]
    pub remote: Option<String>,

    /// Work from the local cache only
    #[arg(long, global = true)]
    pub offline: bool,

    /// Local cache directory (overrides config)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the progress API server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Log in as NAME and load their progress
    Login { name: String },

    /// Forget the current user on this device
    Logout,

    /// Show who is logged in
    Whoami,

    /// Show hearts, quests and rewards at a glance
    Status,

    /// List quests and their progress
    Tasks,

    /// List rewards in the shop
    Rewards,

    /// Mark a quest as done for today
    Complete {
        task_id: String,

        /// Day to record (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Spend hearts on a reward
    Purchase { reward_id: String },

    /// Reveal a purchased reward
    Open { reward_id: String },

    /// Move progress between devices with a magic code
    #[command(subcommand)]
    Code(CodeCommand),

    /// Add quests and rewards to the shared catalog
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand, Debug)]
pub enum CodeCommand {
    /// Print the magic code for the current user's progress
    Export,

    /// Replace the current user's progress with the one in CODE
    Import { code: String },
}
