//! Command-line arguments for the replay player.

use clap::Parser;
use std::path::PathBuf;

/// Replay a diagrid gesture script and print the resulting tree
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the JSON gesture script
    pub script: PathBuf,

    /// Path to an editor configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
