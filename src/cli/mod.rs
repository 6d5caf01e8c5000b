pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chanfeed")]
#[command(about = "Announces new RSS/Atom items in chat channels", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/chanfeed/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect and announce feeds until interrupted
    Run,
    /// Validate the configuration and print what would be watched
    Check,
}
