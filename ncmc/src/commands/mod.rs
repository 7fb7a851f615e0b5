mod convert;
mod inspect;

pub use convert::Convert;
pub use inspect::Inspect;

use anyhow::Result;
use clap::{ColorChoice, Parser, Subcommand};
use log::LevelFilter;

/// Convert NCM music containers into tagged mp3 and flac files.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// When to output colored text.
    #[arg(long, global = true, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Only print errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print debug information.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    Convert(Convert),
    Inspect(Inspect),
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

impl Commands {
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Convert(args) => args.execute(),
            Self::Inspect(args) => args.execute(),
        }
    }
}
