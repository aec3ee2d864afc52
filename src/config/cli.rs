use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::toml_config::DEFAULT_CONFIG_PATH;

#[derive(Debug, Parser)]
#[command(name = "card-recommender")]
#[command(about = "Credit card recommendations aggregated from multiple providers")]
pub struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, help = "Path to the TOML configuration file")]
    pub config: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch recommendations once and print them as JSON.
    Recommend {
        #[arg(long)]
        name: String,

        #[arg(long, allow_negative_numbers = true)]
        score: i64,

        #[arg(long, allow_negative_numbers = true)]
        salary: i64,
    },

    /// Serve the HTTP API.
    #[cfg(feature = "server")]
    Serve {
        #[arg(long, help = "Override server.bind from the configuration file")]
        bind: Option<String>,
    },
}
