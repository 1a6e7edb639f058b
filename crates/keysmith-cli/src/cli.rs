//! Command-line definition.

use anyhow::Result;
use clap::{ArgAction, Parser};
use keysmith_types::LogLevel;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "keysmith")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate the derived secrets of a host fleet", long_about = None)]
#[command(after_help = "Run from the repository root, next to keysmith.yml.")]
pub struct Cli {
    /// Storage paths of the secrets to generate (all when omitted)
    #[arg(value_name = "TARGETS")]
    pub targets: Vec<PathBuf>,

    /// Regenerate the selected secrets even when they are up to date
    #[arg(short = 'f', long = "force-generate")]
    pub force_generate: bool,

    /// Stage every written artifact with git add
    #[arg(short = 'a', long = "add-to-git")]
    pub add_to_git: bool,

    /// Increase log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Console log level selected by `-v`/`-q`.
    pub fn log_level(&self) -> LogLevel {
        if self.quiet {
            return LogLevel::Error;
        }
        match self.verbose {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        crate::commands::generate::execute(self).await
    }
}
