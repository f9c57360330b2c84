//! CLI module for mapagent - command-line interface and subcommands.
//!
//! No subcommand starts the interactive chat.

pub mod commands;

pub use commands::Cli;
