//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gatewatch")]
#[command(author, version, about = "Live allow/block view of HAProxy connection tables")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "/etc/gatewatch/config.yaml", global = true)]
    pub config: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the admin socket and refresh the status page until stopped
    Run,

    /// Run a single poll cycle and exit
    Once,

    /// Show how an address is classified by the configured lists
    Check {
        /// IP address to check
        ip: String,
    },

    /// Print the effective configuration
    Config {
        /// Print the commented default configuration instead
        #[arg(long)]
        default: bool,
    },

    /// Show version information
    Version,
}
