//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - chat: interactive REPL (default)
//! - ask: answer a single message
//! - serve: HTTP chat endpoint
//! - tools: print the tool catalog

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mapagent - a map assistant that answers with OpenStreetMap tools
#[derive(Parser, Debug)]
#[command(name = "mapagent")]
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
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Chat interactively (default)
    Chat,

    /// Answer one message and exit
    Ask {
        /// The message to answer
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Serve the chat endpoint over HTTP
    Serve {
        /// Address to bind, overrides server.bind from config
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// List the available tools
    Tools,
}

impl Commands {
    /// Message words of `ask` joined into one string
    pub fn ask_message(&self) -> Option<String> {
        match self {
            Commands::Ask { message } => Some(message.join(" ")),
            _ => None,
        }
    }
}
