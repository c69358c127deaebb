pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newsbrief")]
#[command(about = "Daily world and China headline digest, translated and pushed to ServerChan", long_about = None)]
pub struct Cli {
    /// Path to a config file (default: ~/.config/newsbrief/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Build the digest and push it (default)
    Run {
        /// Print the digest to stdout instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch one feed and list its items
    Fetch {
        /// URL of the feed
        url: String,

        /// Maximum number of items (default: top_k_per_source)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Translate titles with the configured provider chain
    Translate {
        /// Titles to translate
        #[arg(required = true)]
        titles: Vec<String>,
    },
}

impl Cli {
    /// The subcommand to execute; `run` when none was given.
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Run { dry_run: false })
    }
}
