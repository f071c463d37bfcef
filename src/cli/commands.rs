//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - gate / bash-guard / test-reminder: hook entry points (event on stdin)
//! - marker: inspect or change a session's activation record

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// serena-hooks - gate assistant tool use on Serena initialization
#[derive(Parser, Debug)]
#[command(name = "serena-hooks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Block tool calls until Serena is initialized (PreToolUse and PostToolUse)
    Gate,

    /// Redirect shell commands to Serena tools or npm scripts (PreToolUse)
    BashGuard,

    /// Remind to run tests after editing source files (PostToolUse)
    TestReminder,

    /// Inspect or change a session's activation marker
    Marker {
        #[command(subcommand)]
        command: MarkerCommands,
    },
}

/// Marker management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum MarkerCommands {
    /// Show the activation record for a session
    Show {
        /// Session ID from the host
        #[arg(short, long)]
        session: String,
    },

    /// Mark every initialization step done for a session
    Activate {
        /// Session ID from the host
        #[arg(short, long)]
        session: String,

        /// Project name to record
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Remove the activation record for a session
    Clear {
        /// Session ID from the host
        #[arg(short, long)]
        session: String,
    },
}

impl MarkerCommands {
    /// Session the command applies to
    pub fn session(&self) -> &str {
        match self {
            MarkerCommands::Show { session }
            | MarkerCommands::Activate { session, .. }
            | MarkerCommands::Clear { session } => session,
        }
    }
}
