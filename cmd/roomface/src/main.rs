//! roomface - group a room's photos by face and find the group a new photo belongs to.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{ClusterCommand, ExportCommand, RoomsCommand, SearchCommand, ShowCommand};

/// roomface - face grouping for photo rooms.
///
/// Photos dropped in the intake directory are clustered by identity into
/// `clusters/<room>/cluster_<n>/`. A photo dropped in the search directory
/// is then matched against a room's clusters.
///
/// Configuration is read from ~/.roomface/config.yaml unless --config is given.
#[derive(Parser)]
#[command(name = "roomface")]
#[command(about = "Group photos by face per room and search the groups")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.roomface/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base directory for intake, search and cluster directories
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Face extractor program (overrides config file)
    #[arg(long, global = true)]
    pub extractor: Option<String>,

    /// Verbose output (debug logs on stderr)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cluster every intake photo into a room
    Cluster(ClusterCommand),
    /// Match the search photo against a room's clusters
    Search(SearchCommand),
    /// List rooms that have clusters
    Rooms(RoomsCommand),
    /// Show a room's clusters and their photos
    Show(ShowCommand),
    /// Package a cluster's photos into a zip archive
    Export(ExportCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs always go to stderr; stdout is reserved for command output.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Cluster(cmd) => cmd.run(&cli),
        Commands::Search(cmd) => cmd.run(&cli),
        Commands::Rooms(cmd) => cmd.run(&cli),
        Commands::Show(cmd) => cmd.run(&cli),
        Commands::Export(cmd) => cmd.run(&cli),
    }
}
