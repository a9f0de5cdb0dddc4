//! Command-line definitions for the `hapresence` binary.
//!
//! This module is also compiled by `build.rs` for man page generation,
//! so it must only depend on clap + clap_complete.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "hapresence",
    version,
    about = "Home Assistant presence bridge — fetch person presence, probe connectivity, manage settings",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the config file (defaults to the platform config dir)
    #[arg(long, global = true, env = "HAPRESENCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current person presence
    Presence,

    /// Probe connectivity to the Home Assistant instance
    Test(TestArgs),

    /// Read and write configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct TestArgs {
    /// Base URL to probe (defaults to the configured ha_url)
    #[arg(long)]
    pub url: Option<String>,

    /// Access token to probe with (defaults to the configured ha_token)
    #[arg(long, env = "HAPRESENCE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Connection timeout in seconds (defaults to the configured value)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Verify SSL certificates (defaults to the configured value)
    #[arg(long)]
    pub verify_ssl: Option<bool>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show every configuration key and its effective value
    Show,

    /// Print a single configuration value
    Get { key: String },

    /// Validate and persist a configuration value
    Set { key: String, value: String },

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
