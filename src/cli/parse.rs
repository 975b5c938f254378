//! CLI parse: clap types for the screenshot harness. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Screenshot CLI - capture site screenshots into a local node store
#[derive(Parser)]
#[command(name = "screenshot")]
#[command(about = "Capture site screenshots and keep them fresh")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a site node and capture its screenshot
    Add {
        /// Site URL to capture
        url: String,
        /// Site node id (default: derived from the URL)
        #[arg(long)]
        id: Option<String>,
    },
    /// Refresh expired screenshots and keep live ones
    Bootstrap,
    /// List screenshot nodes
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
