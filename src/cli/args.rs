//! CLI argument definitions using clap

use clap::Parser;
use clap_complete::Shell;

/// Alfred workflow: run macOS Services on the current pasteboard content
#[derive(Parser, Debug)]
#[command(name = "alfred-services")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Filter services by name (fuzzy, case-insensitive)
    pub query: Option<String>,

    /// Check for a newer version of the workflow and exit
    #[arg(long)]
    pub update: bool,

    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Print shell completions and exit
    #[arg(long = "generate", value_enum)]
    pub generator: Option<Shell>,

    /// Print the effective configuration as TOML and exit
    #[arg(long, conflicts_with_all = ["update", "config_template"])]
    pub show_config: bool,

    /// Print a commented configuration file and exit
    #[arg(long, conflicts_with = "update")]
    pub config_template: bool,
}

impl Cli {
    /// The query with surrounding whitespace removed; empty if absent.
    pub fn query(&self) -> &str {
        self.query.as_deref().map(str::trim).unwrap_or_default()
    }
}
