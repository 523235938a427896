use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "deck-validator")]
#[command(about = "Validate a pair of Commander decks against Scryfall and report them")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate both decks and cache the result when it passes
    Validate(ValidateArgs),
    /// Post the cached result to the webhook
    Send,
    /// Drop the cached result (what an input change does)
    Clear,
}

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    #[arg(long, default_value = "")]
    pub p1_commander: String,

    #[arg(long, help = "Player 1 decklist file, one card per line")]
    pub p1_deck: Option<PathBuf>,

    #[arg(long, default_value = "")]
    pub p2_commander: String,

    #[arg(long, help = "Player 2 decklist file, one card per line")]
    pub p2_deck: Option<PathBuf>,

    #[arg(long, help = "Send the report right away if validation passes")]
    pub send: bool,
}
