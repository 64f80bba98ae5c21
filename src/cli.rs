use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "snippet-catalog")]
#[command(about = "Catalog and search reusable JSON-Schema snippets", version, long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/snippet-catalog/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Search backend URL, overrides the config file
    #[arg(long, global = true, env = "SNIPPETS_BACKEND_URL")]
    pub url: Option<String>,

    /// Index name, overrides the config file
    #[arg(long, global = true, env = "SNIPPETS_INDEX")]
    pub index: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the index if it does not exist
    Provision,
    /// Register a snippet from a JSON file, or stdin with `-`
    Create { file: PathBuf },
    /// Delete the snippet with this $id
    Delete { id: String },
    /// Search snippets, newest first
    Search {
        query: Option<String>,
        /// Maximum number of results (0 uses the configured default)
        #[arg(short = 'n', long, default_value = "0")]
        limit: usize,
    },
}
