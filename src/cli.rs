//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Discord bot that frames a member's profile picture on request.
#[derive(Parser, Debug)]
#[command(name = "pfp-framer", version, about)]
pub struct Cli {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do; defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect to Discord and serve the liveness endpoint.
    Run {
        /// Frame image path override.
        #[arg(long)]
        frame: Option<PathBuf>,

        /// Liveness port override.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Frame a single image and write the result to disk.
    Frame {
        /// Image URL (http/https) or local file path.
        source: String,

        /// Output file path.
        #[arg(short, long, default_value = "pfp_with_frame.png")]
        output: PathBuf,

        /// Frame image path override.
        #[arg(long)]
        frame: Option<PathBuf>,
    },
}

impl Cli {
    /// The subcommand to run, `run` with no overrides when none was given.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run { frame: None, port: None })
    }
}

/// Whether a `frame` source should be downloaded rather than read from disk.
#[must_use]
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
