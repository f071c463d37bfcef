//! CLI module for serena-hooks - command-line interface and subcommands.
//!
//! Hook subcommands are what the host configures; `marker` is for humans.

pub mod commands;

pub use commands::Cli;
