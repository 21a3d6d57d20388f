use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "pipelines-api",
    version,
    about = "HTTP backend for sales opportunities and contacts"
)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create missing tables, then serve the HTTP API (default)
    Serve,
    /// Create missing tables and exit
    Migrate,
    /// Print every stored record of a resource, one per line
    Report {
        #[arg(value_enum)]
        resource: Resource,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
    Opportunities,
    Contacts,
}
